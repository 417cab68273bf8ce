use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::crm::choices::choices;
use crate::crm::dashboard::{snapshot, DashboardSnapshot};
use crate::crm::error::CrmError;
use crate::crm::types::Choices;

pub async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSnapshot>, CrmError> {
    let body = state.with_conn(snapshot).await?;
    Ok(Json(body))
}

pub async fn handle_choices(State(state): State<Arc<AppState>>) -> Result<Json<Choices>, CrmError> {
    let body = state.with_conn(choices).await?;
    Ok(Json(body))
}
