//! End-to-end tests: a real back end and front end on loopback ports,
//! driven over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Response, StatusCode};
use tessera::prelude::*;

const SECRET: &str = "integration-secret";

// =========================================================================
// Harness
// =========================================================================

fn config() -> TesseraConfig {
    TesseraConfig::new(SECRET)
        .frontend_addr("127.0.0.1:0")
        .backend_addr("127.0.0.1:0")
}

fn users() -> StaticAuthenticator {
    StaticAuthenticator::new().with_user("ada", "lovelace")
}

async fn spawn_backend(config: &TesseraConfig, store: SharedStore) -> SocketAddr {
    let service = Service::backend(Arc::new(config.clone()), store)
        .await
        .unwrap();
    let addr = service.local_addr().unwrap();
    tokio::spawn(service.run());
    addr
}

async fn spawn_frontend(
    config: &TesseraConfig,
    store: SharedStore,
    backend_url: String,
) -> SocketAddr {
    let config = config.clone().backend_url(backend_url);
    let service = Service::frontend(Arc::new(config), store, users())
        .await
        .unwrap();
    let addr = service.local_addr().unwrap();
    tokio::spawn(service.run());
    addr
}

/// Both services over one store. Returns (frontend, backend).
async fn spawn_pair(config: &TesseraConfig, store: SharedStore) -> (SocketAddr, SocketAddr) {
    let backend = spawn_backend(config, Arc::clone(&store)).await;
    let frontend = spawn_frontend(config, store, format!("http://{backend}")).await;
    (frontend, backend)
}

fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new(Duration::from_secs(300)))
}

/// The `name=value` pair of the response's `Set-Cookie`, if any.
fn set_cookie(response: &Response) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    header.split(';').next().map(str::to_string)
}

fn session_id_of(cookie: &str) -> SessionId {
    let (_, value) = cookie.split_once('=').unwrap();
    SessionId::new(tessera_token::decode_cookie_value(value, SECRET).unwrap())
}

async fn login(frontend: SocketAddr, cookie: Option<&str>, password: &str) -> Response {
    let mut request = reqwest::Client::new()
        .post(format!("http://{frontend}/login"))
        .json(&serde_json::json!({ "username": "ada", "password": password }));
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    request.send().await.unwrap()
}

async fn fetch(url: String, cookie: Option<&str>) -> Response {
    let mut request = reqwest::Client::new().get(url);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    request.send().await.unwrap()
}

fn counts(html: &str) -> (u64, u64) {
    let read = |marker: &str| -> u64 {
        let start = html.find(marker).unwrap() + marker.len();
        let end = start + html[start..].find('<').unwrap();
        html[start..end].parse().unwrap()
    };
    (
        read(r#"<span id="views">"#),
        read(r#"<span id="api-views">"#),
    )
}

/// Creates and saves sessions, but every `set` fails.
struct UnwritableStore(MemoryStore);

#[async_trait]
impl SessionStore for UnwritableStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        self.0.get(id).await
    }

    async fn set(
        &self,
        _id: &SessionId,
        _record: &SessionRecord,
        _ttl: Duration,
    ) -> Result<(), SessionError> {
        Err(SessionError::StoreUnavailable(std::io::Error::other(
            "store is read-only",
        )))
    }

    async fn create(&self) -> Result<SessionId, SessionError> {
        self.0.create().await
    }
}

/// A store that can't be reached at all.
struct UnreachableStore;

fn unreachable() -> SessionError {
    SessionError::StoreUnavailable(std::io::Error::other("store unreachable"))
}

#[async_trait]
impl SessionStore for UnreachableStore {
    async fn get(&self, _id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        Err(unreachable())
    }

    async fn set(
        &self,
        _id: &SessionId,
        _record: &SessionRecord,
        _ttl: Duration,
    ) -> Result<(), SessionError> {
        Err(unreachable())
    }

    async fn create(&self) -> Result<SessionId, SessionError> {
        Err(unreachable())
    }
}

// =========================================================================
// Propagation
// =========================================================================

#[tokio::test]
async fn test_logged_in_views_match_on_both_services() {
    let (frontend, _) = spawn_pair(&config(), memory_store()).await;

    let response = login(frontend, None, "lovelace").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap();

    let first = fetch(format!("http://{frontend}/"), Some(&cookie)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let html = first.text().await.unwrap();
    assert_eq!(counts(&html), (1, 1));
    assert!(html.contains("Welcome back, ada."));

    let second = fetch(format!("http://{frontend}/"), Some(&cookie)).await;
    assert_eq!(counts(&second.text().await.unwrap()), (2, 2));
}

#[tokio::test]
async fn test_fresh_visitor_is_counted_then_rejected_by_backend() {
    let store = memory_store();
    let (frontend, _) = spawn_pair(&config(), Arc::clone(&store)).await;

    let response = fetch(format!("http://{frontend}/"), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cookie = set_cookie(&response).unwrap();
    let record = store.get(&session_id_of(&cookie)).await.unwrap().unwrap();
    assert_eq!(record.view_count, 1);
    assert!(!record.is_authenticated());
}

#[tokio::test]
async fn test_login_keeps_view_count_and_moves_to_new_id() {
    let store = memory_store();
    let (frontend, _) = spawn_pair(&config(), Arc::clone(&store)).await;

    let anonymous = fetch(format!("http://{frontend}/"), None).await;
    let before = set_cookie(&anonymous).unwrap();

    let response = login(frontend, Some(&before), "lovelace").await;
    let after = set_cookie(&response).unwrap();
    assert_ne!(session_id_of(&before), session_id_of(&after));

    let page = fetch(format!("http://{frontend}/"), Some(&after)).await;
    assert_eq!(counts(&page.text().await.unwrap()), (2, 2));
}

#[tokio::test]
async fn test_login_wrong_password_is_401_without_cookie() {
    let (frontend, _) = spawn_pair(&config(), memory_store()).await;

    let response = login(frontend, None, "babbage").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_login_malformed_body_is_422_with_opaque_body() {
    let (frontend, _) = spawn_pair(&config(), memory_store()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{frontend}/login"))
        .json(&serde_json::json!({ "username": "ada" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookie(&response).is_none());
    let body: StatusBody = response.json().await.unwrap();
    assert_eq!(body, StatusBody::new("Unprocessable Entity"));
}

#[tokio::test]
async fn test_file_store_shared_by_separately_opened_handles() {
    let dir = tempfile::tempdir().unwrap();
    let config = config().store(StoreTarget::File(dir.path().to_path_buf()));

    // Two handles on one directory, as two processes would have.
    let backend = spawn_backend(&config, config.open_store().await.unwrap()).await;
    let frontend = spawn_frontend(
        &config,
        config.open_store().await.unwrap(),
        format!("http://{backend}"),
    )
    .await;

    let cookie = set_cookie(&login(frontend, None, "lovelace").await).unwrap();
    let page = fetch(format!("http://{frontend}/"), Some(&cookie)).await;

    assert_eq!(page.status(), StatusCode::OK);
    assert_eq!(counts(&page.text().await.unwrap()), (1, 1));
}

// =========================================================================
// Back-end gate over HTTP
// =========================================================================

#[tokio::test]
async fn test_backend_rejects_forged_cookie() {
    let store = memory_store();
    let backend = spawn_backend(&config(), Arc::clone(&store)).await;
    let id = store.create().await.unwrap();
    let record = SessionRecord {
        authenticated_identity: Some("ada".into()),
        view_count: 9,
    };
    store.set(&id, &record, Duration::from_secs(300)).await.unwrap();

    let forged = format!("connect.sid=s%3A{id}.bm90LWEtc2lnbmF0dXJl");
    let response = fetch(format!("http://{backend}/api"), Some(&forged)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: StatusBody = response.json().await.unwrap();
    assert_eq!(body, StatusBody::new("Unauthorized"));
}

#[tokio::test]
async fn test_backend_rejects_signed_anonymous_session() {
    let store = memory_store();
    let backend = spawn_backend(&config(), Arc::clone(&store)).await;
    let id = store.create().await.unwrap();
    let record = SessionRecord {
        authenticated_identity: None,
        view_count: 5,
    };
    store.set(&id, &record, Duration::from_secs(300)).await.unwrap();

    let cookie = tessera_token::cookie_header("connect.sid", id.as_str(), SECRET);
    let response = fetch(format!("http://{backend}/api"), Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_404_json() {
    let (frontend, backend) = spawn_pair(&config(), memory_store()).await;

    for url in [
        format!("http://{frontend}/nope"),
        format!("http://{backend}/nope"),
    ] {
        let response = fetch(url, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: StatusBody = response.json().await.unwrap();
        assert_eq!(body, StatusBody::new("Not Found"));
    }
}

#[tokio::test]
async fn test_health_on_both_services() {
    let (frontend, backend) = spawn_pair(&config(), memory_store()).await;

    for addr in [frontend, backend] {
        let response = fetch(format!("http://{addr}/health"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: StatusBody = response.json().await.unwrap();
        assert_eq!(body, StatusBody::ok());
    }
}

// =========================================================================
// Failure modes
// =========================================================================

#[tokio::test]
async fn test_failed_save_is_500_and_backend_never_called() {
    // Nothing listens here: reaching the back end would be a 502.
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let backend_url = format!("http://{}", unused.local_addr().unwrap());
    drop(unused);

    let store: SharedStore =
        Arc::new(UnwritableStore(MemoryStore::new(Duration::from_secs(300))));
    let frontend = spawn_frontend(&config(), store, backend_url).await;

    let response = fetch(format!("http://{frontend}/"), None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookie(&response).is_none());
    let body: StatusBody = response.json().await.unwrap();
    assert_eq!(body, StatusBody::new("Internal Server Error"));
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let backend_url = format!("http://{}", unused.local_addr().unwrap());
    drop(unused);

    let frontend = spawn_frontend(&config(), memory_store(), backend_url).await;
    let response = fetch(format!("http://{frontend}/"), None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    // The view was saved, so the browser still gets its cookie.
    assert!(set_cookie(&response).is_some());
}

#[tokio::test]
async fn test_slow_backend_is_504() {
    let slow = Router::new().route(
        "/api",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(ApiViews::ok(0))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let slow_addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, slow).await });

    let config = config().upstream_timeout(Duration::from_millis(100));
    let frontend =
        spawn_frontend(&config, memory_store(), format!("http://{slow_addr}")).await;

    let response = fetch(format!("http://{frontend}/"), None).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_backend_store_read_failure_is_500_not_401() {
    let backend = spawn_backend(&config(), Arc::new(UnreachableStore)).await;

    let cookie = tessera_token::cookie_header("connect.sid", "some-id", SECRET);
    let response = fetch(format!("http://{backend}/api"), Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: StatusBody = response.json().await.unwrap();
    assert_eq!(body, StatusBody::new("Internal Server Error"));
}

#[tokio::test]
async fn test_frontend_store_read_failure_is_500_without_page() {
    let backend = spawn_backend(&config(), memory_store()).await;
    let frontend = spawn_frontend(
        &config(),
        Arc::new(UnreachableStore),
        format!("http://{backend}"),
    )
    .await;

    let cookie = tessera_token::cookie_header("connect.sid", "some-id", SECRET);
    let response = fetch(format!("http://{frontend}/"), Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookie(&response).is_none());
    let body: StatusBody = response.json().await.unwrap();
    assert_eq!(body, StatusBody::new("Internal Server Error"));
}
