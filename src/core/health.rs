use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

/// Liveness probe. Touches no state so it answers even when the database is down.
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn test_health_check_reports_ok() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "ok");
        assert!(DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
        assert!(body.timestamp.ends_with('Z'));
    }
}
