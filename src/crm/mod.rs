pub mod associations;
pub mod choices;
pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod error;
pub mod handlers;
pub mod lookup;
pub mod pagination;
pub mod storage;
pub mod tasks;
pub mod types;
pub mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use error::{CrmError, ValidationErrors};
pub use lookup::RecordLookup;
pub use pagination::{Page, PageRequest};
pub use types::*;
pub use validation::WriteKind;

use handlers::companies::*;
use handlers::contacts::*;
use handlers::dashboard::*;
use handlers::deals::*;
use handlers::tasks::*;

pub fn configure_crm_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/crm/dashboard", get(handle_dashboard))
        .route("/api/crm/choices", get(handle_choices))
        .route("/api/crm/companies", get(handle_list_companies))
        .route("/api/crm/companies", post(handle_create_company))
        .route("/api/crm/companies/:id", get(handle_get_company))
        .route("/api/crm/companies/:id", put(handle_update_company))
        .route("/api/crm/companies/:id", delete(handle_delete_company))
        .route("/api/crm/contacts", get(handle_list_contacts))
        .route("/api/crm/contacts", post(handle_create_contact))
        .route("/api/crm/contacts/:id", get(handle_get_contact))
        .route("/api/crm/contacts/:id", put(handle_update_contact))
        .route("/api/crm/contacts/:id", delete(handle_delete_contact))
        .route("/api/crm/contacts/:id/tasks", get(handle_contact_tasks))
        .route("/api/crm/deals", get(handle_list_deals))
        .route("/api/crm/deals", post(handle_create_deal))
        .route("/api/crm/deals/:id", get(handle_get_deal))
        .route("/api/crm/deals/:id", put(handle_update_deal))
        .route("/api/crm/deals/:id", delete(handle_delete_deal))
        .route("/api/crm/deals/:id/tasks", get(handle_deal_tasks))
        .route("/api/crm/tasks", get(handle_list_tasks))
        .route("/api/crm/tasks", post(handle_create_task))
        .route("/api/crm/tasks/:id", get(handle_get_task))
        .route("/api/crm/tasks/:id", put(handle_update_task))
        .route("/api/crm/tasks/:id", delete(handle_delete_task))
}
