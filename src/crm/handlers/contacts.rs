use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::crm::associations::{related_names, tasks_for};
use crate::crm::contacts;
use crate::crm::error::CrmError;
use crate::crm::pagination::Page;
use crate::crm::types::{Contact, ContactDetail, ContactView, RawPayload, RelatedType, TaskView};

use super::ListQuery;

pub async fn handle_list_contacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ContactView>>, CrmError> {
    let request = query.page_request(&state);
    let page = state
        .with_conn(move |conn| contacts::list(conn, request))
        .await?;
    Ok(Json(page))
}

pub async fn handle_get_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ContactDetail>, CrmError> {
    let contact = state.with_conn(move |conn| contacts::get(conn, id)).await?;
    Ok(Json(contact))
}

pub async fn handle_contact_tasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TaskView>>, CrmError> {
    let tasks = state
        .with_conn(move |conn| {
            contacts::find(conn, id)?;
            let tasks = tasks_for(conn, RelatedType::Contact, id)?;
            related_names(conn, tasks)
        })
        .await?;
    Ok(Json(tasks))
}

pub async fn handle_create_contact(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawPayload>,
) -> Result<(StatusCode, Json<Contact>), CrmError> {
    let contact = state
        .with_conn(move |conn| contacts::create(conn, &payload))
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn handle_update_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawPayload>,
) -> Result<Json<Contact>, CrmError> {
    let contact = state
        .with_conn(move |conn| contacts::update(conn, id, &payload))
        .await?;
    Ok(Json(contact))
}

pub async fn handle_delete_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CrmError> {
    state.with_conn(move |conn| contacts::delete(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
