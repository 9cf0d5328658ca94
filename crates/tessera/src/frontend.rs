//! The front-end service: turns a browser session into an attested call.
//!
//! `GET /` runs the propagation sequence:
//!
//! 1. Load the browser's session (or create one).
//! 2. Count the view.
//! 3. Save, and wait for the store to acknowledge.
//! 4. Sign the session id and call the back end's `/api` with it.
//! 5. Merge the back end's view count into the page.
//!
//! Steps 3 and 4 are strictly ordered. If the call went out before the save
//! landed, the back end would read the previous count.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tessera_protocol::{ApiViews, LoginRequest, PageModel, StatusBody};
use tessera_session::Authenticator;
use tessera_transport::HttpUpstream;

use crate::page::render_index;
use crate::server::{health, not_found};
use crate::{LoadedSession, SessionLayer, TesseraError};

/// Page title shown on the index page.
const TITLE: &str = "Tessera";

/// Shared state for front-end handlers.
pub struct FrontendState<A: Authenticator> {
    layer: SessionLayer,
    upstream: HttpUpstream,
    auth: A,
}

impl<A: Authenticator> FrontendState<A> {
    /// Creates the front end's state.
    ///
    /// `upstream` must point at a back end sharing this layer's store,
    /// cookie name and secret.
    pub fn new(layer: SessionLayer, upstream: HttpUpstream, auth: A) -> Self {
        Self {
            layer,
            upstream,
            auth,
        }
    }

    /// Counts a view, saves it, then asks the back end for its count.
    ///
    /// The session's `view_count` is incremented here and nowhere else.
    ///
    /// # Errors
    /// Store failures, and every way the back-end call can fail.
    pub async fn propagate(
        &self,
        session: &mut LoadedSession,
    ) -> Result<PageModel, TesseraError> {
        let views = session.record.record_view();

        self.layer.save(session).await?;

        let cookie = self.layer.outbound_cookie(&session.id);
        let api: ApiViews = self.upstream.get_json("/api", &cookie).await?;

        if api.views != views {
            // Another tab of the same browser saved in between.
            tracing::debug!(
                session_id = %session.id,
                views,
                api_views = api.views,
                "back end saw a different view count"
            );
        }

        Ok(PageModel {
            title: TITLE.to_string(),
            username: session.record.authenticated_identity.clone(),
            views,
            api_views: api.views,
        })
    }
}

/// Builds the front end's routes: `GET /`, `POST /login`, `GET /health`,
/// 404 fallback.
pub fn router<A: Authenticator>(state: Arc<FrontendState<A>>) -> Router {
    Router::new()
        .route("/", get(index::<A>))
        .route("/login", post(login::<A>))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

/// `GET /`: the index page, with both services' view counts.
async fn index<A: Authenticator>(
    State(state): State<Arc<FrontendState<A>>>,
    headers: HeaderMap,
) -> Result<Response, TesseraError> {
    let mut session = state.layer.load(&headers).await?;

    let mut response = match state.propagate(&mut session).await {
        Ok(page) => Html(render_index(&page)).into_response(),
        // The save failed, so there is no session to hand out.
        Err(e @ TesseraError::Session(_)) => return Err(e),
        // The save landed; the cookie below still has to reach the browser.
        Err(e) => e.into_response(),
    };

    if session.is_new {
        attach_cookie(&mut response, &state.layer, &session);
    }
    Ok(response)
}

/// `POST /login`: checks credentials and records the identity.
///
/// The session moves to a fresh id on login, so an id handed out before
/// login can't be used to ride the logged-in session. The view count comes
/// along. Failed logins change nothing and answer with a bare 401; a body
/// that isn't `{username, password}` gets the rejection's status and the
/// same opaque body as every other error.
async fn login<A: Authenticator>(
    State(state): State<Arc<FrontendState<A>>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, TesseraError> {
    let Json(credentials) = payload?;

    let identity = state
        .auth
        .authenticate(&credentials.username, &credentials.password)
        .await
        .inspect_err(|e| {
            tracing::info!(username = %credentials.username, reason = %e, "login rejected");
        })?;

    let previous = state.layer.load_existing(&headers).await?;
    let mut session = state.layer.create().await?;
    if let Some(previous) = previous {
        session.record = previous.record;
    }
    session.record.authenticated_identity = Some(identity);
    state.layer.save(&session).await?;

    tracing::info!(session_id = %session.id, username = %credentials.username, "user logged in");

    let mut response = Json(StatusBody::ok()).into_response();
    attach_cookie(&mut response, &state.layer, &session);
    Ok(response)
}

fn attach_cookie(response: &mut Response, layer: &SessionLayer, session: &LoadedSession) {
    match HeaderValue::from_str(&layer.set_cookie(session)) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => {
            tracing::error!(error = %e, "session cookie is not a valid header value");
        }
    }
}
