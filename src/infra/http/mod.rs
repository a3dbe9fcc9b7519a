pub mod api;
pub mod federation;
pub mod middleware;

pub use api::{ApiState, PageLimits, build_api_router};
pub use federation::{FederationState, build_federation_router};
pub use middleware::{REQUEST_ID_HEADER, RequestState};

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::middleware as axum_middleware;
use url::Url;

use crate::application::following::FollowingService;
use crate::application::lists::ListsService;
use crate::application::store::CachedStore;

#[derive(Clone, Debug)]
pub struct RouterState {
    pub api: ApiState,
    pub federation: FederationState,
}

impl RouterState {
    pub fn new(store: CachedStore, public_url: Url, page_limits: PageLimits) -> Self {
        Self {
            api: ApiState {
                lists: Arc::new(ListsService::new(store.clone())),
                public_url,
                page_limits,
            },
            federation: FederationState {
                following: Arc::new(FollowingService::new(store)),
            },
        }
    }
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

impl FromRef<RouterState> for FederationState {
    fn from_ref(state: &RouterState) -> Self {
        state.federation.clone()
    }
}

/// Every public route, wrapped in request-state and response logging layers.
pub fn build_router(state: RouterState) -> Router {
    Router::new()
        .merge(build_api_router(state.clone()))
        .merge(build_federation_router(state.clone()))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_state))
        .with_state(state)
}
