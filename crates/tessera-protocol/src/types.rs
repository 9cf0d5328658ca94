//! JSON bodies exchanged on the HTTP routes.
//!
//! Field names follow what the services have always sent (`status`,
//! `views`), so a client written against the old deployment keeps working.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StatusBody
// ---------------------------------------------------------------------------

/// The `{ "status": ... }` body used by `/health`, `/login` and every error
/// response.
///
/// Error responses carry the HTTP reason phrase and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    /// `{"status":"OK"}`.
    pub fn ok() -> Self {
        Self::new("OK")
    }

    /// A body with the given status text.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiViews
// ---------------------------------------------------------------------------

/// The back end's answer to an authorized `GET /api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiViews {
    pub status: String,
    /// The view count the back end read from the shared store.
    pub views: u64,
}

impl ApiViews {
    /// `{"status":"OK","views":<views>}`.
    pub fn ok(views: u64) -> Self {
        Self {
            status: "OK".to_string(),
            views,
        }
    }
}

// ---------------------------------------------------------------------------
// LoginRequest
// ---------------------------------------------------------------------------

/// Credentials posted to the front end's `POST /login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Hand-written so passwords never end up in a `{:?}` log line.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// PageModel
// ---------------------------------------------------------------------------

/// Everything the front end's index page shows.
///
/// `views` is the front end's own count; `api_views` is what the back end
/// reported for the same session after the front end's write landed. With
/// a single writer the two are always equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageModel {
    pub title: String,
    pub username: Option<String>,
    pub views: u64,
    pub api_views: u64,
}
