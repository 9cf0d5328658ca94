//! The back-end service: a verification gate in front of protected data.
//!
//! Every request to `/api` goes through the same gate:
//!
//! ```text
//!   Unverified ──(token verifies)──→ Verified(id) ──(record has identity)──→ Authorized
//!       │                                 │
//!       └──(missing/forged/malformed)──→ Rejected ←──(no record / anonymous)──┘
//! ```
//!
//! - **Unverified**: the request arrived; nothing about it is trusted.
//! - **Verified**: the signed cookie checked out, so the session id is
//!   known to come from a holder of the secret. Only now is the store
//!   consulted, and only for that id.
//! - **Authorized**: the stored record carries an identity set by login.
//! - **Rejected**: everything else, answered with a bare 401.
//!
//! The gate only reads. View counts belong to the front end, and a second
//! writer here would count every page twice.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use tessera_protocol::ApiViews;
use tessera_session::SessionError;

use crate::server::{health, not_found};
use crate::{LoadedSession, SessionLayer, TesseraError};

/// Outcome of running a request through the gate.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Verified token, live record, identity present.
    Authorized(LoadedSession),
    /// Anything else. Carries no reason on purpose.
    Rejected,
}

/// Shared state for back-end handlers.
pub struct BackendState {
    layer: SessionLayer,
}

impl BackendState {
    /// Creates the back end's state over a session layer.
    pub fn new(layer: SessionLayer) -> Self {
        Self { layer }
    }

    /// Runs the request's headers through the gate.
    ///
    /// # Errors
    /// Only store failures. A bad token is a [`GateDecision::Rejected`],
    /// not an error.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
    ) -> Result<GateDecision, SessionError> {
        let Some(session) = self.layer.load_existing(headers).await? else {
            return Ok(GateDecision::Rejected);
        };

        if !session.record.is_authenticated() {
            tracing::debug!(session_id = %session.id, "session has no identity");
            return Ok(GateDecision::Rejected);
        }

        Ok(GateDecision::Authorized(session))
    }
}

/// Builds the back end's routes: `GET /api`, `GET /health`, 404 fallback.
pub fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/api", get(api))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

/// `GET /api`: the view count of an authorized session, or 401.
async fn api(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<ApiViews>, TesseraError> {
    match state.authorize(&headers).await? {
        GateDecision::Authorized(session) => {
            tracing::debug!(
                session_id = %session.id,
                views = session.record.view_count,
                "api request authorized"
            );
            Ok(Json(ApiViews::ok(session.record.view_count)))
        }
        GateDecision::Rejected => Err(TesseraError::Unauthorized),
    }
}
