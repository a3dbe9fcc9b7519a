mod support;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use fedcache::application::repos::RepoError;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use support::{ADMIN_ID, Fixture, LIST_ID, NEWER_ENTRY_ID, OLDER_ENTRY_ID, REMOTE_ID, ZORK_ID};

/// Log sink shared with the test body.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn get(
    router: &Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = router
        .clone()
        .oneshot(request.body(Body::empty()).expect("request should build"))
        .await
        .expect("router should respond");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, headers, body)
}

fn link(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::LINK)
        .map(|value| value.to_str().expect("ascii link header"))
}

fn account_ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|account| account["id"].as_str().expect("account id"))
        .collect()
}

fn accounts_uri(query: &str) -> String {
    format!("/api/v1/lists/{LIST_ID}/accounts{query}")
}

fn expected_link(limit: usize, next_max_id: &str, prev_min_id: &str) -> String {
    format!(
        "<http://localhost:8080/api/v1/lists/{LIST_ID}/accounts?limit={limit}&max_id={next_max_id}>; rel=\"next\", \
         <http://localhost:8080/api/v1/lists/{LIST_ID}/accounts?limit={limit}&min_id={prev_min_id}>; rel=\"prev\""
    )
}

#[tokio::test]
async fn list_accounts_default_limit_links_both_directions() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    for query in ["?limit=40", ""] {
        let (status, headers, body) = get(&router, &accounts_uri(query), &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(account_ids(&body), vec![ADMIN_ID, REMOTE_ID]);
        assert_eq!(
            link(&headers),
            Some(expected_link(40, OLDER_ENTRY_ID, NEWER_ENTRY_ID).as_str())
        );
    }
}

#[tokio::test]
async fn list_accounts_pages_one_entry_at_a_time() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (status, headers, body) = get(&router, &accounts_uri("?limit=1"), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![ADMIN_ID]);
    assert_eq!(
        link(&headers),
        Some(expected_link(1, NEWER_ENTRY_ID, NEWER_ENTRY_ID).as_str())
    );

    let next = format!("?limit=1&max_id={NEWER_ENTRY_ID}");
    let (status, headers, body) = get(&router, &accounts_uri(&next), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![REMOTE_ID]);
    assert_eq!(
        link(&headers),
        Some(expected_link(1, OLDER_ENTRY_ID, OLDER_ENTRY_ID).as_str())
    );

    let past_end = format!("?limit=1&max_id={OLDER_ENTRY_ID}");
    let (status, headers, body) = get(&router, &accounts_uri(&past_end), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert!(account_ids(&body).is_empty());
    assert_eq!(link(&headers), None);
}

#[tokio::test]
async fn list_accounts_min_id_returns_the_adjacent_newer_page() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let prev = format!("?limit=1&min_id={OLDER_ENTRY_ID}");
    let (status, _, body) = get(&router, &accounts_uri(&prev), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![ADMIN_ID]);
}

#[tokio::test]
async fn list_accounts_unpaginated_has_no_link_header() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (status, headers, body) = get(&router, &accounts_uri("?limit=0"), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![ADMIN_ID, REMOTE_ID]);
    assert!(headers.get(header::LINK).is_none());
}

#[tokio::test]
async fn list_accounts_clamps_large_limits() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (status, headers, _) = get(&router, &accounts_uri("?limit=500"), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        link(&headers),
        Some(expected_link(80, OLDER_ENTRY_ID, NEWER_ENTRY_ID).as_str())
    );
}

#[tokio::test]
async fn list_accounts_rejects_invalid_limits() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    for query in ["?limit=abc", "?limit=-1"] {
        let (status, _, body) = get(&router, &accounts_uri(query), &[]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn unknown_list_is_not_found() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (status, _, body) = get(&router, "/api/v1/lists/01NOPE/accounts", &[]).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn transient_repository_failures_are_unavailable() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();
    fixture.repos.fail_reads(Some(RepoError::Timeout));

    let (status, _, body) = get(&router, &accounts_uri(""), &[]).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "db_timeout");

    // Nothing was remembered about the failed lookups.
    fixture.repos.fail_reads(None);
    let (status, _, body) = get(&router, &accounts_uri(""), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![ADMIN_ID, REMOTE_ID]);
}

#[tokio::test]
async fn list_accounts_skips_accounts_that_no_longer_exist() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    fixture
        .store
        .delete_account(ADMIN_ID)
        .await
        .expect("delete account");

    let (status, _, body) = get(&router, &accounts_uri(""), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account_ids(&body), vec![REMOTE_ID]);
}

#[tokio::test]
async fn following_collection_lists_target_uris() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (status, headers, body) = get(&router, "/users/the_mighty_zork/following", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"application/activity+json"[..])
    );
    assert_eq!(body["type"], "Collection");
    assert_eq!(
        body["id"],
        "http://localhost:8080/users/the_mighty_zork/following"
    );
    assert_eq!(body["totalItems"], 2);
    assert_eq!(
        body["items"],
        serde_json::json!([
            "http://fossbros-anonymous.io/users/foss_satan",
            "http://localhost:8080/users/admin",
        ])
    );
}

#[tokio::test]
async fn following_collection_skips_missing_targets() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    fixture
        .store
        .delete_account(REMOTE_ID)
        .await
        .expect("delete account");

    let (status, _, body) = get(&router, "/users/the_mighty_zork/following", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 1);
    assert_eq!(
        body["items"],
        serde_json::json!(["http://localhost:8080/users/admin"])
    );
}

#[tokio::test]
async fn following_collection_of_unknown_user_is_not_found() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    // Remote accounts have no local following collection.
    let (status, _, _) = get(&router, "/users/foss_satan/following", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&router, "/users/nobody/following", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_preserved_or_generated() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();

    let (_, headers, _) = get(
        &router,
        &accounts_uri(""),
        &[("x-request-id", "client-supplied-id")],
    )
    .await;
    assert_eq!(
        headers.get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"client-supplied-id"[..])
    );

    // Error responses carry one too.
    let (status, headers, _) = get(&router, "/api/v1/lists/01NOPE/accounts", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let generated = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("generated request id");
    assert_eq!(generated.len(), 22);
    assert_ne!(generated, "client-supplied-id");
}

#[tokio::test]
async fn page_links_keep_the_public_url_path_prefix() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router_at("http://localhost:8080/social/");

    let (status, headers, _) = get(&router, &accounts_uri("?limit=1"), &[]).await;

    assert_eq!(status, StatusCode::OK);
    let expected = format!(
        "<http://localhost:8080/social/api/v1/lists/{LIST_ID}/accounts?limit=1&max_id={NEWER_ENTRY_ID}>; rel=\"next\", \
         <http://localhost:8080/social/api/v1/lists/{LIST_ID}/accounts?limit=1&min_id={NEWER_ENTRY_ID}>; rel=\"prev\""
    );
    assert_eq!(link(&headers), Some(expected.as_str()));
}

#[tokio::test]
async fn handler_records_reach_the_response_log() {
    let fixture = Fixture::seeded().await;
    let router = fixture.router();
    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (status, _, _) = get(
        &router,
        "/users/the_mighty_zork/following",
        &[("x-request-id", "following-req")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let line = logs
        .contents()
        .lines()
        .find(|line| line.contains("request completed"))
        .map(str::to_string)
        .expect("response log line");
    // The account ID only exists inside the handler.
    assert!(line.contains(ZORK_ID), "{line}");
    assert!(line.contains("total_items"), "{line}");
    assert!(line.contains("following-req"), "{line}");
}
