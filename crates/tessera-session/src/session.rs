//! Session types: the data a store keeps per user agent.
//!
//! A session is a record keyed by an opaque id. It tracks:
//! - WHO the user is, once they've logged in (`authenticated_identity`)
//! - HOW MANY pages they've viewed (`view_count`)
//!
//! Nothing else. What a service may do on behalf of a request is decided
//! by looking at the record, never at the token that named it.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// How sessions are named, signed and kept.
///
/// Both services must be given the same values. A back end with a
/// different secret rejects every token; one with a different cookie name
/// never finds the cookie.
#[derive(Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the signed session id.
    ///
    /// Default: `connect.sid`.
    pub cookie_name: String,

    /// Shared signing secret.
    pub secret: String,

    /// Idle lifetime of a stored record. Every save restarts it.
    ///
    /// Default: 300 seconds.
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "connect.sid".to_string(),
            secret: String::new(),
            ttl: Duration::from_secs(300),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque identifier naming a session record in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh id: 24 random bytes as URL-safe base64
    /// (32 characters, 192 bits of entropy).
    pub fn generate() -> Self {
        let bytes: [u8; 24] = rand::rng().random();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps an id recovered from a verified token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if every character is one [`generate`](Self::generate) can
    /// produce. Stores that turn ids into file names refuse anything else.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The data stored for one session.
///
/// Serialized with the field names the deployment has always used
/// (`username`, `views`) so either service can read what the other wrote.
/// Unknown fields are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Set by a successful login. The back end serves protected data only
    /// when this is present.
    #[serde(
        rename = "username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub authenticated_identity: Option<String>,

    /// Pages viewed in this session. Only the front end increments it.
    #[serde(rename = "views", default)]
    pub view_count: u64,
}

impl SessionRecord {
    /// `true` once a login has set the identity.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated_identity.is_some()
    }

    /// Counts one more page view and returns the new count.
    pub fn record_view(&mut self) -> u64 {
        self.view_count = self.view_count.saturating_add(1);
        self.view_count
    }
}
