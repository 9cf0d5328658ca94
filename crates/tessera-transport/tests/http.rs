//! Integration tests for `HttpUpstream` against a real local HTTP server.
//!
//! Each test binds an axum router to `127.0.0.1:0` so the OS picks a free
//! port, then points an `HttpUpstream` at it.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tessera_transport::{HttpUpstream, TransportError};

#[derive(Debug, Deserialize, PartialEq)]
struct Echo {
    cookie: String,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn test_router() -> Router {
    Router::new()
        .route(
            "/echo",
            get(|headers: HeaderMap| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(serde_json::json!({ "cookie": cookie }))
            }),
        )
        .route(
            "/denied",
            get(|| async { (StatusCode::UNAUTHORIZED, "Unauthorized") }),
        )
        .route("/text", get(|| async { "plain text" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({ "cookie": "late" }))
            }),
        )
}

#[tokio::test]
async fn test_get_json_sends_cookie_and_decodes_body() {
    let base = serve(test_router()).await;
    let upstream = HttpUpstream::new(&base, Duration::from_secs(2)).unwrap();

    let echo: Echo = upstream
        .get_json("/echo", "connect.sid=s%3Aabc.def")
        .await
        .expect("call should succeed");

    assert_eq!(echo.cookie, "connect.sid=s%3Aabc.def");
}

#[tokio::test]
async fn test_get_json_non_success_status_is_error() {
    let base = serve(test_router()).await;
    let upstream = HttpUpstream::new(&base, Duration::from_secs(2)).unwrap();

    let result = upstream.get_json::<Echo>("/denied", "").await;

    assert!(matches!(result, Err(TransportError::Status(401))));
}

#[tokio::test]
async fn test_get_json_unexpected_body_is_decode_error() {
    let base = serve(test_router()).await;
    let upstream = HttpUpstream::new(&base, Duration::from_secs(2)).unwrap();

    let result = upstream.get_json::<Echo>("/text", "").await;

    assert!(matches!(result, Err(TransportError::Decode(_))));
}

#[tokio::test]
async fn test_get_json_slow_upstream_times_out() {
    let base = serve(test_router()).await;
    let upstream =
        HttpUpstream::new(&base, Duration::from_millis(100)).unwrap();

    let result = upstream.get_json::<Echo>("/slow", "").await;

    assert!(
        matches!(result, Err(TransportError::Timeout(t)) if t == Duration::from_millis(100)),
        "expected timeout, got {result:?}"
    );
}

#[tokio::test]
async fn test_get_json_nothing_listening_is_request_error() {
    // Bind, note the port, then close the listener so nothing answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let upstream =
        HttpUpstream::new(&format!("http://{addr}"), Duration::from_secs(2))
            .unwrap();

    let result = upstream.get_json::<Echo>("/echo", "").await;

    assert!(matches!(result, Err(TransportError::Request(_))));
}
