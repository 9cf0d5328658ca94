//! Unified error type for the Tessera services.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tessera_protocol::StatusBody;
use tessera_session::SessionError;
use tessera_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Handlers return `Result<_, TesseraError>` and let `?` convert
/// sub-crate errors through the `#[from]` impls. The [`IntoResponse`] impl
/// decides what the client sees: a status code and its reason phrase,
/// never the error text.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    /// A store or login error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The call to the back end failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request body wasn't the JSON the route expects.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Binding or serving a listener failed.
    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request has no authenticated session.
    ///
    /// Deliberately carries no reason: a missing cookie, a forged one and
    /// an anonymous session all look the same from outside.
    #[error("unauthorized")]
    Unauthorized,

    /// No route matched.
    #[error("not found")]
    NotFound,
}

impl TesseraError {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Session(SessionError::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport(TransportError::Status(401)) => StatusCode::UNAUTHORIZED,
            Self::Transport(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidBody(rejection) => rejection.status(),
            Self::Io(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TesseraError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, Json(StatusBody::new(reason))).into_response()
    }
}
