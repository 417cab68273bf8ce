use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::crm::companies;
use crate::crm::error::CrmError;
use crate::crm::pagination::Page;
use crate::crm::types::{Company, CompanyDetail, RawPayload};

use super::ListQuery;

pub async fn handle_list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Company>>, CrmError> {
    let request = query.page_request(&state);
    let page = state
        .with_conn(move |conn| companies::list(conn, request))
        .await?;
    Ok(Json(page))
}

pub async fn handle_get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CompanyDetail>, CrmError> {
    let company = state.with_conn(move |conn| companies::get(conn, id)).await?;
    Ok(Json(company))
}

pub async fn handle_create_company(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawPayload>,
) -> Result<(StatusCode, Json<Company>), CrmError> {
    let company = state
        .with_conn(move |conn| companies::create(conn, &payload))
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn handle_update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawPayload>,
) -> Result<Json<Company>, CrmError> {
    let company = state
        .with_conn(move |conn| companies::update(conn, id, &payload))
        .await?;
    Ok(Json(company))
}

pub async fn handle_delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CrmError> {
    state.with_conn(move |conn| companies::delete(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
