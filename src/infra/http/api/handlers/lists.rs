//! List handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderValue, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::pagination::PageParams;

use super::request_url;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::AccountResponse;
use crate::infra::http::api::state::ApiState;
use crate::infra::http::middleware::RequestState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
}

pub async fn list_accounts(
    State(state): State<ApiState>,
    Path(list_id): Path<String>,
    Query(query): Query<PageQuery>,
    Extension(request): Extension<RequestState>,
    uri: Uri,
) -> Result<Response, ApiError> {
    request.record("list_id", list_id.as_str());
    let page = PageParams::parse(
        query.limit.as_deref(),
        state.page_limits.default,
        state.page_limits.max,
        query.max_id.as_deref(),
        query.since_id.as_deref(),
        query.min_id.as_deref(),
    )
    .map_err(|err| ApiError::bad_request("invalid limit", Some(err.to_string())))?;
    let base = request_url(&state.public_url, &uri);

    let result = state.lists.list_accounts(&list_id, &page, &base).await?;
    request.record("accounts", result.accounts.len().to_string());
    let accounts: Vec<AccountResponse> = result
        .accounts
        .into_iter()
        .map(AccountResponse::from)
        .collect();

    let mut response = Json(accounts).into_response();
    if let Some(links) = result.links
        && let Ok(value) = HeaderValue::from_str(&links.header_value())
    {
        response.headers_mut().insert(header::LINK, value);
    }
    Ok(response)
}
