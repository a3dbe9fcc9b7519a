use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use once_cell::sync::Lazy;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::{debug, error, warn};

use crate::application::error::ErrorReport;
use crate::cache::lock::mutex_lock;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

static REQUEST_ID_RNG: Lazy<Mutex<StdRng>> = Lazy::new(|| Mutex::new(StdRng::from_entropy()));

/// Per-request data shared between middleware and handlers.
///
/// Clones share one record, so values a handler records are visible to the
/// layers wrapped around it once the response comes back.
#[derive(Debug, Clone)]
pub struct RequestState {
    inner: Arc<RequestInner>,
}

#[derive(Debug)]
struct RequestInner {
    request_id: String,
    started_at: Instant,
    recorded: Mutex<Vec<(&'static str, String)>>,
}

impl RequestState {
    pub fn new(request_id: String) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                request_id,
                started_at: Instant::now(),
                recorded: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.inner.started_at
    }

    /// Attach `value` under `key` to the response log line. A later value
    /// for the same key replaces the earlier one.
    pub fn record(&self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        let mut recorded = mutex_lock(&self.inner.recorded, "request_state", "record");
        match recorded.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => recorded.push((key, value)),
        }
    }

    /// Everything recorded so far, in first-recorded order.
    pub fn recorded(&self) -> Vec<(&'static str, String)> {
        mutex_lock(&self.inner.recorded, "request_state", "recorded").clone()
    }
}

/// A fresh request ID: 16 random bytes, URL-safe base64.
pub fn generate_request_id() -> String {
    let mut bytes = [0u8; 16];
    mutex_lock(&REQUEST_ID_RNG, "request_id_rng", "generate").fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn incoming_request_id(request: &Request<Body>) -> Option<String> {
    let value = request.headers().get(&REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

/// Attach a [`RequestState`] to the request and echo its ID on the response.
pub async fn set_request_state(mut request: Request<Body>, next: Next) -> Response {
    let request_id = incoming_request_id(&request).unwrap_or_else(generate_request_id);
    let state = RequestState::new(request_id);
    request.extensions_mut().insert(state.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(state.request_id()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response.extensions_mut().insert(state);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let state = request.extensions().get::<RequestState>().cloned();
    let (request_id, start) = match state.as_ref() {
        Some(state) => (state.request_id().to_string(), state.started_at()),
        None => (String::new(), Instant::now()),
    };

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let recorded = state.map(|state| state.recorded()).unwrap_or_default();

    if status.is_client_error() || status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "fedcache::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                recorded = ?recorded,
                "request failed",
            );
        } else {
            warn!(
                target = "fedcache::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                recorded = ?recorded,
                "client request error",
            );
        }
    } else {
        debug!(
            target = "fedcache::http::response",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed_ms,
            request_id = request_id,
            recorded = ?recorded,
            "request completed",
        );
    }

    response
}
