use std::time::Duration;

/// Errors that can occur while calling another service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured base URL or request path can't be parsed.
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),

    /// No complete response arrived within the timeout.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// The request couldn't be sent or the connection failed.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The body wasn't the JSON shape the caller expected.
    #[error("upstream body undecodable: {0}")]
    Decode(#[source] reqwest::Error),
}
