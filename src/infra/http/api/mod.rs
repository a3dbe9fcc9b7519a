pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::{ApiState, PageLimits};

use axum::{Router, routing::get};

use crate::infra::http::RouterState;

pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    Router::new()
        .route("/api/v1/lists/{id}/accounts", get(handlers::list_accounts))
        .with_state(state)
}
