use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::crm::error::CrmError;
use crate::crm::pagination::Page;
use crate::crm::tasks;
use crate::crm::types::{RawPayload, Task, TaskView};

use super::ListQuery;

pub async fn handle_list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<TaskView>>, CrmError> {
    let request = query.page_request(&state);
    let page = state.with_conn(move |conn| tasks::list(conn, request)).await?;
    Ok(Json(page))
}

pub async fn handle_get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TaskView>, CrmError> {
    let task = state.with_conn(move |conn| tasks::get(conn, id)).await?;
    Ok(Json(task))
}

pub async fn handle_create_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawPayload>,
) -> Result<(StatusCode, Json<Task>), CrmError> {
    let today = Utc::now().date_naive();
    let task = state
        .with_conn(move |conn| tasks::create(conn, &payload, today))
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn handle_update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawPayload>,
) -> Result<Json<Task>, CrmError> {
    let today = Utc::now().date_naive();
    let task = state
        .with_conn(move |conn| tasks::update(conn, id, &payload, today))
        .await?;
    Ok(Json(task))
}

pub async fn handle_delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CrmError> {
    state.with_conn(move |conn| tasks::delete(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
