//! `reqwest`-based upstream client.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::TransportError;

/// A client for one upstream service, rooted at a base URL.
///
/// Cheap to clone: `reqwest::Client` is an `Arc` around a connection
/// pool, so every clone shares the same keep-alive connections.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpUpstream {
    /// Creates a client for the service at `base_url`
    /// (e.g. `http://127.0.0.1:3001`).
    ///
    /// # Errors
    /// - [`TransportError::InvalidUrl`]: `base_url` doesn't parse
    /// - [`TransportError::Request`]: the HTTP client couldn't be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The bound on every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET`s `path` with the given `Cookie` header and decodes the JSON
    /// body.
    ///
    /// The whole exchange (connect, send, status, body) is bounded by the
    /// timeout. A non-2xx status is an error even if the body would decode.
    ///
    /// # Errors
    /// - [`TransportError::Timeout`]: nothing complete within the timeout
    /// - [`TransportError::Request`]: connection or send failure
    /// - [`TransportError::Status`]: non-2xx response
    /// - [`TransportError::Decode`]: body isn't a `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        cookie: &str,
    ) -> Result<T, TransportError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;

        let call = async {
            let response = self
                .client
                .get(url.clone())
                .header(COOKIE, cookie)
                .send()
                .await
                .map_err(TransportError::Request)?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            response.json::<T>().await.map_err(TransportError::Decode)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => {
                if let Err(e) = &result {
                    tracing::debug!(%url, error = %e, "upstream call failed");
                }
                result
            }
            Err(_) => {
                tracing::warn!(%url, timeout = ?self.timeout, "upstream call timed out");
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}
