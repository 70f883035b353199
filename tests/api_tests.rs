//! Integration tests for learnhub-rs against a local mock server.
//!
//! Every test starts its own `wiremock` server, mounts a token endpoint and
//! the API routes it needs, and drives the public client end to end.
//!
//! Run with: cargo test --test api_tests
//! Set `RUST_LOG=learnhub_rs=debug` to see request logging.

use std::sync::Once;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_string, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use learnhub_rs::prelude::*;

static INIT: Once = Once::new();

/// Initialize logging for tests
fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// base64("secret")
const BASIC_SECRET: &str = "Basic c2VjcmV0";

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Course {
    id: String,
    title: String,
    #[serde(with = "learnhub_rs::client::timestamp")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
}

fn client_for(server: &MockServer) -> LearnHubClient {
    LearnHubClient::new(
        ClientConfig::new(server.uri(), "secret").with_timeout(Duration::from_secs(10)),
    )
    .expect("client")
}

async fn mount_token(server: &MockServer, token: &str, expires_in: i64, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("authorization", BASIC_SECRET))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": token, "expires_in": expires_in })),
        )
        .expect(expected)
        .mount(server)
        .await;
}

// =============================================================================
// Single-value requests
// =============================================================================

#[tokio::test]
async fn test_single_request_renews_and_attaches_bearer() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/courses/c-1"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "title": "Algebra",
            "createdAt": "2024-01-15T09:30:00.000+0000"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = Request::<One<Course>>::get("/v1/courses/{courseId}").path_param("courseId", "c-1");

    let course = client.run(&request).await.expect("first call");
    assert_eq!(course.title, "Algebra");
    assert_eq!(course.created_at.to_rfc3339(), "2024-01-15T09:30:00+00:00");

    // Second call reuses the cached token.
    client.run(&request).await.expect("second call");
    assert_eq!(client.credentials().current().await, "T1");
}

#[tokio::test]
async fn test_not_found_carries_body() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/courses/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"no such course"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&Request::<One<Course>>::get("/v1/courses/{id}").path_param("id", "missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::NotFound { path, body } => {
            assert_eq!(path, "/v1/courses/missing");
            assert_eq!(body, r#"{"message":"no such course"}"#);
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_status_is_not_retried() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&Request::<One<User>>::get("/v1/me"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(err.body(), Some("maintenance"));
}

#[tokio::test]
async fn test_no_content_decodes_to_unit() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("DELETE"))
        .and(path("/v1/courses/c-1/students/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::<One<()>>::delete("/v1/courses/{courseId}/students/{userId}")
        .path_param("courseId", "c-1")
        .path_param("userId", 42);
    client_for(&server).run(&request).await.expect("delete");
}

#[tokio::test]
async fn test_json_body_is_sent() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/courses"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"title":"Geometry"}"#))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c-2",
            "title": "Geometry",
            "createdAt": "2024-02-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::<One<Course>>::post("/v1/courses")
        .json(&json!({ "title": "Geometry" }))
        .unwrap();
    let course = client_for(&server).run(&request).await.expect("create");
    assert_eq!(course.id, "c-2");
}

#[tokio::test]
async fn test_malformed_body() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&Request::<One<User>>::get("/v1/me"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { ref body, .. } if body == "<html>"));
}

#[tokio::test]
async fn test_invalid_utf8_body_is_replaced_before_decoding() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'"', 0xff, b'"']))
        .mount(&server)
        .await;

    let name = client_for(&server)
        .run(&Request::<One<String>>::get("/v1/me"))
        .await
        .expect("lossy text still decodes");
    assert_eq!(name, "\u{FFFD}");
}

// =============================================================================
// Transport failures
// =============================================================================

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    init_logging();
    // Bind then drop a listener so the port is known to be closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let client = LearnHubClient::new(
        ClientConfig::new(format!("http://127.0.0.1:{port}"), "secret")
            .with_connect_timeout(Duration::from_secs(2)),
    )
    .expect("client");

    let err = client
        .run(&Request::<One<User>>::get("/v1/me"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_retryable());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/reports/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 1 }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = LearnHubClient::new(
        ClientConfig::new(server.uri(), "secret")
            .with_timeout(Duration::from_millis(500))
            .with_write_timeout(Duration::from_millis(500)),
    )
    .expect("client");

    let err = client
        .run(&Request::<One<User>>::get("/v1/reports/slow"))
        .await
        .unwrap_err();

    match &err {
        Error::Transport(e) => assert!(e.is_timeout()),
        other => panic!("Expected Transport, got {other:?}"),
    }
    assert!(err.is_retryable());
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_token_failure_surfaces_and_skips_request() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.run(&Request::<One<User>>::get("/v1/me")).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(client.credentials().is_expired().await);
}

#[tokio::test]
async fn test_zero_lifetime_renews_every_call() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "short", 0, 2).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer short"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.run(&Request::<One<User>>::get("/v1/me")).await.unwrap();
    client.run(&Request::<One<User>>::get("/v1/me")).await.unwrap();
}

#[tokio::test]
async fn test_refresh_credentials_forces_exchange() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 2).await;

    let client = client_for(&server);
    client.refresh_credentials().await.unwrap();
    client.refresh_credentials().await.unwrap();

    let expires_at = client.credentials().expires_at().await;
    assert!(expires_at > Utc::now() + chrono::Duration::minutes(59));
}

// =============================================================================
// Pagination
// =============================================================================

async fn mount_user_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param_is_missing("offset"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1 }, { "id": 2 }],
            "paging": { "nextPage": "/v1/users?offset=10" }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("offset", "10"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 3 }]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_request_walks_pages() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;
    mount_user_pages(&server).await;

    let users = client_for(&server)
        .run(&Request::<Many<User>>::get("/v1/users"))
        .await
        .expect("list");

    assert_eq!(users, vec![User { id: 1 }, User { id: 2 }, User { id: 3 }]);
}

#[tokio::test]
async fn test_list_failure_on_later_page() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1 }],
            "paging": { "nextPage": "/v1/users?offset=1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&Request::<Many<User>>::get("/v1/users"))
        .await
        .unwrap_err();

    match err {
        Error::NotFound { path, .. } => assert_eq!(path, "/v1/users?offset=1"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_matches_list() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;
    mount_user_pages(&server).await;

    let client = client_for(&server);
    let mut stream = client.stream(&Request::<Many<User>>::get("/v1/users"));

    let mut ids = Vec::new();
    while let Some(user) = stream.next().await {
        ids.push(user.expect("user").id);
    }

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(stream.pages_fetched(), 2);
}

// =============================================================================
// Blocking facade
// =============================================================================

#[tokio::test]
async fn test_run_blocking_outside_runtime() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;
    mount_user_pages(&server).await;

    let uri = server.uri();
    let users = std::thread::spawn(move || {
        let client = LearnHubClient::new(ClientConfig::new(uri, "secret")).expect("client");
        client.run_blocking(&Request::<Many<User>>::get("/v1/users"))
    })
    .join()
    .expect("thread")
    .expect("list");

    assert_eq!(users.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_blocking_inside_multi_thread_runtime() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "T1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server)
        .run_blocking(&Request::<One<User>>::get("/v1/me"))
        .expect("me");
    assert_eq!(user, User { id: 5 });
}
