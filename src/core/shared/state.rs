use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::crm::CrmError;
use diesel::PgConnection;

#[derive(Clone)]
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        Self { conn, config }
    }

    /// Runs blocking diesel work on the blocking pool with a pooled connection.
    pub async fn with_conn<T, F>(&self, f: F) -> Result<T, CrmError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, CrmError> + Send + 'static,
    {
        let pool = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| CrmError::Connection(e.to_string()))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| CrmError::Internal(format!("Blocking task failed: {e}")))?
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &self.config)
            .finish()
    }
}
