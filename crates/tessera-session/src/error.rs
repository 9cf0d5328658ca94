//! Error types for the session layer.

use tessera_protocol::ProtocolError;

/// Errors that can occur while storing sessions or logging a user in.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The store could not be read or written.
    ///
    /// Not recoverable inside a request: the caller answers with a 5xx.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[source] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("session record unreadable: {0}")]
    Corrupt(#[from] ProtocolError),

    /// The id is not one this store could have issued.
    #[error("malformed session id")]
    MalformedId,

    /// Login failed. The reason is for logs only; clients see a bare 401.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}

impl SessionError {
    /// `true` for failures of the store itself rather than of the caller.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Corrupt(_))
    }
}
