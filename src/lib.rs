pub mod core;
pub mod crm;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::core::health::health_check;
use crate::core::shared::state::AppState;

pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .merge(crm::configure_crm_routes())
        .layer(create_cors_layer())
        .with_state(state)
}
