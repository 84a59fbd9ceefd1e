//! End-to-end fetch tests against a local mock event service.
//!
//! Each test starts an axum server on an ephemeral port that answers the
//! query endpoint with a canned status and body.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use fdsn_client::{ClientConfig, EventClient, EventQuery, FetchError, FetchOutcome};
use test_utils::fdsn::{BAD_REQUEST_BODY, GEOJSON_EMPTY, GEOJSON_ONE_EVENT, NON_UTF8_BODY};
use test_utils::scratch_dir;
use test_utils::time::{QUERY_END, QUERY_START};

const QUERY_PATH: &str = "/fdsnws/event/1/query";

/// Serve `router` on 127.0.0.1 and return the query endpoint URL.
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}{QUERY_PATH}")
}

/// A service that always answers with `status` and `body`.
async fn canned(status: StatusCode, body: &'static [u8]) -> String {
    spawn_server(Router::new().route(QUERY_PATH, get(move || async move { (status, body) }))).await
}

fn client_for(endpoint: String) -> EventClient {
    EventClient::new(ClientConfig {
        endpoint,
        request_timeout: Some(Duration::from_secs(5)),
        ..ClientConfig::default()
    })
    .unwrap()
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_success_returns_body() {
    let client = client_for(canned(StatusCode::OK, GEOJSON_ONE_EVENT.as_bytes()).await);

    let outcome = client.fetch(&EventQuery::default()).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.status().as_u16(), 200);
    assert_eq!(outcome.body().unwrap().as_ref(), GEOJSON_ONE_EVENT.as_bytes());

    let json: serde_json::Value = serde_json::from_slice(outcome.body().unwrap()).unwrap();
    assert_eq!(json["features"][0]["id"], "us2000ahv0");
}

#[tokio::test]
async fn test_success_writes_exact_bytes() {
    let client = client_for(canned(StatusCode::OK, GEOJSON_ONE_EVENT.as_bytes()).await);
    let dir = scratch_dir();
    let path = dir.path().join("html").join("data").join("earthquakes.geojson");

    let outcome = client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(std::fs::read(&path).unwrap(), GEOJSON_ONE_EVENT.as_bytes());
}

#[tokio::test]
async fn test_non_utf8_body_written_verbatim() {
    let client = client_for(canned(StatusCode::OK, NON_UTF8_BODY).await);
    let dir = scratch_dir();
    let path = dir.path().join("events.bin");

    client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), NON_UTF8_BODY);
}

#[tokio::test]
async fn test_success_overwrites_existing_file() {
    let client = client_for(canned(StatusCode::OK, GEOJSON_EMPTY.as_bytes()).await);
    let dir = scratch_dir();
    let path = dir.path().join("earthquakes.geojson");
    std::fs::write(&path, "x".repeat(4096)).unwrap();

    client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), GEOJSON_EMPTY.as_bytes());
}

#[tokio::test]
async fn test_no_content_leaves_existing_file() {
    let client = client_for(canned(StatusCode::NO_CONTENT, b"").await);
    let dir = scratch_dir();
    let path = dir.path().join("earthquakes.geojson");
    std::fs::write(&path, GEOJSON_ONE_EVENT).unwrap();

    let outcome = client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.status().as_u16(), 204);
    assert!(outcome.body().is_none());
    assert_eq!(std::fs::read(&path).unwrap(), GEOJSON_ONE_EVENT.as_bytes());
}

#[tokio::test]
async fn test_other_2xx_writes_nothing() {
    for status in [StatusCode::CREATED, StatusCode::ACCEPTED, StatusCode::PARTIAL_CONTENT] {
        let client = client_for(canned(status, GEOJSON_EMPTY.as_bytes()).await);
        let dir = scratch_dir();
        let path = dir.path().join("earthquakes.geojson");

        let outcome = client
            .fetch_to_file(&EventQuery::default(), &path)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Failure { .. }), "{status} counted as data");
        assert!(!path.exists());
    }
}

// ============================================================================
// Failure
// ============================================================================

#[tokio::test]
async fn test_failure_status_writes_nothing() {
    for status in [
        StatusCode::BAD_REQUEST,
        StatusCode::NOT_FOUND,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::SERVICE_UNAVAILABLE,
    ] {
        let client = client_for(canned(status, BAD_REQUEST_BODY.as_bytes()).await);
        let dir = scratch_dir();
        let path = dir.path().join("earthquakes.geojson");

        let outcome = client
            .fetch_to_file(&EventQuery::default(), &path)
            .await
            .unwrap();
        assert!(
            matches!(outcome, FetchOutcome::Failure { status: s } if s.as_u16() == status.as_u16())
        );
        assert!(!path.exists(), "{status} created the destination");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

#[tokio::test]
async fn test_failure_leaves_existing_file_untouched() {
    let client = client_for(canned(StatusCode::BAD_REQUEST, BAD_REQUEST_BODY.as_bytes()).await);
    let dir = scratch_dir();
    let path = dir.path().join("earthquakes.geojson");
    std::fs::write(&path, GEOJSON_ONE_EVENT).unwrap();

    let outcome = client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(std::fs::read(&path).unwrap(), GEOJSON_ONE_EVENT.as_bytes());
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{addr}{QUERY_PATH}"));
    let dir = scratch_dir();
    let path = dir.path().join("earthquakes.geojson");

    let err = client
        .fetch_to_file(&EventQuery::default(), &path)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let router = Router::new().route(
        QUERY_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            GEOJSON_EMPTY
        }),
    );
    let endpoint = spawn_server(router).await;
    let client = EventClient::new(ClientConfig {
        endpoint,
        request_timeout: Some(Duration::from_millis(200)),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client.fetch(&EventQuery::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

// ============================================================================
// Request
// ============================================================================

#[tokio::test]
async fn test_server_sees_request_url_query() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let recorder = Arc::clone(&seen);
    let router = Router::new().route(
        QUERY_PATH,
        get(move |RawQuery(query): RawQuery| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().unwrap() = query;
                GEOJSON_EMPTY
            }
        }),
    );
    let client = client_for(spawn_server(router).await);
    let query = EventQuery {
        limit: Some(3),
        ..EventQuery::default()
    };

    let outcome = client.fetch(&query).await.unwrap();
    assert!(outcome.is_success());

    let expected = client.request_url(&query).unwrap();
    let received = seen.lock().unwrap().clone().unwrap();
    assert_eq!(Some(received.as_str()), expected.query());
    let encoded = |s: &str| s.replace(':', "%3A");
    assert!(received.contains(&format!("starttime={}", encoded(QUERY_START))));
    assert!(received.contains(&format!("endtime={}", encoded(QUERY_END))));
    assert!(received.contains("limit=3"));
}
