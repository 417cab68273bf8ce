use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::crm::associations::{related_names, tasks_for};
use crate::crm::deals;
use crate::crm::error::CrmError;
use crate::crm::pagination::Page;
use crate::crm::types::{Deal, DealDetail, DealView, RawPayload, RelatedType, TaskView};

use super::ListQuery;

pub async fn handle_list_deals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<DealView>>, CrmError> {
    let request = query.page_request(&state);
    let page = state.with_conn(move |conn| deals::list(conn, request)).await?;
    Ok(Json(page))
}

pub async fn handle_get_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DealDetail>, CrmError> {
    let deal = state.with_conn(move |conn| deals::get(conn, id)).await?;
    Ok(Json(deal))
}

pub async fn handle_deal_tasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TaskView>>, CrmError> {
    let tasks = state
        .with_conn(move |conn| {
            deals::find(conn, id)?;
            let tasks = tasks_for(conn, RelatedType::Deal, id)?;
            related_names(conn, tasks)
        })
        .await?;
    Ok(Json(tasks))
}

pub async fn handle_create_deal(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawPayload>,
) -> Result<(StatusCode, Json<Deal>), CrmError> {
    let deal = state
        .with_conn(move |conn| deals::create(conn, &payload))
        .await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn handle_update_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawPayload>,
) -> Result<Json<Deal>, CrmError> {
    let deal = state
        .with_conn(move |conn| deals::update(conn, id, &payload))
        .await?;
    Ok(Json(deal))
}

pub async fn handle_delete_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CrmError> {
    state.with_conn(move |conn| deals::delete(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
