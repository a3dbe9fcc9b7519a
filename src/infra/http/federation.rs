//! ActivityPub collection endpoints.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};

use crate::application::following::FollowingService;
use crate::infra::http::RouterState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::middleware::RequestState;

const ACTIVITY_JSON: &str = "application/activity+json";

#[derive(Clone, Debug)]
pub struct FederationState {
    pub following: Arc<FollowingService>,
}

pub fn build_federation_router(state: RouterState) -> Router<RouterState> {
    Router::new()
        .route("/users/{username}/following", get(following))
        .with_state(state)
}

async fn following(
    State(state): State<FederationState>,
    Path(username): Path<String>,
    Extension(request): Extension<RequestState>,
) -> Result<Response, ApiError> {
    let collection = state.following.following(&username).await?;
    request.record("account_id", collection.account_id.as_str());
    request.record("total_items", collection.total_items.to_string());
    let mut response = Json(collection).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(ACTIVITY_JSON),
    );
    Ok(response)
}
