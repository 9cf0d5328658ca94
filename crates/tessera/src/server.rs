//! `Service`: binding, request logging and the serve loop.
//!
//! Both services are built the same way: validate the config, build the
//! role's state and routes, bind a listener. [`Service::run`] then serves
//! until the process ends, or [`Service::run_with_shutdown`] until a signal
//! fires.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Json, Router};
use tessera_protocol::StatusBody;
use tessera_session::{Authenticator, SharedStore};
use tessera_transport::HttpUpstream;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::backend::{self, BackendState};
use crate::frontend::{self, FrontendState};
use crate::{SessionLayer, TesseraConfig, TesseraError};

/// Installs the global `tracing` subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Calling it twice is
/// harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// `GET /health` on both services.
pub(crate) async fn health() -> Json<StatusBody> {
    Json(StatusBody::ok())
}

/// Fallback for unmatched routes.
pub(crate) async fn not_found() -> TesseraError {
    TesseraError::NotFound
}

/// One line per request, after the response is produced.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// A bound, ready-to-serve front end or back end.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tessera::prelude::*;
///
/// # async fn run() -> Result<(), TesseraError> {
/// let config = Arc::new(TesseraConfig::new("a shared secret").backend_addr("0.0.0.0:3001"));
/// let store = config.open_store().await?;
/// let backend = Service::backend(config, store).await?;
/// backend.run().await
/// # }
/// ```
pub struct Service {
    name: &'static str,
    listener: TcpListener,
    router: Router,
}

impl Service {
    /// Builds the back end and binds `config.backend_addr`.
    ///
    /// # Errors
    /// [`TesseraError::Config`] for an invalid config,
    /// [`TesseraError::Io`] if the address can't be bound.
    pub async fn backend(
        config: Arc<TesseraConfig>,
        store: SharedStore,
    ) -> Result<Self, TesseraError> {
        config.validate()?;

        let layer = SessionLayer::new(store, config.session.clone());
        let router = backend::router(Arc::new(BackendState::new(layer)));

        Self::bind("backend", &config.backend_addr, router).await
    }

    /// Builds the front end and binds `config.frontend_addr`.
    ///
    /// `store` must be the same store the back end reads, and `auth`
    /// decides who may log in.
    ///
    /// # Errors
    /// [`TesseraError::Config`] for an invalid config,
    /// [`TesseraError::Transport`] if `config.backend_url` doesn't parse,
    /// [`TesseraError::Io`] if the address can't be bound.
    pub async fn frontend<A: Authenticator>(
        config: Arc<TesseraConfig>,
        store: SharedStore,
        auth: A,
    ) -> Result<Self, TesseraError> {
        config.validate()?;

        let upstream = HttpUpstream::new(&config.backend_url, config.upstream_timeout)?;
        let layer = SessionLayer::new(store, config.session.clone());
        let router = frontend::router(Arc::new(FrontendState::new(layer, upstream, auth)));

        Self::bind("frontend", &config.frontend_addr, router).await
    }

    async fn bind(
        name: &'static str,
        addr: &str,
        router: Router,
    ) -> Result<Self, TesseraError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(service = name, addr = %listener.local_addr()?, "listening");

        Ok(Self {
            name,
            listener,
            router: router.layer(middleware::from_fn(log_requests)),
        })
    }

    /// The address the service is bound to.
    ///
    /// Useful when binding port `0`.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), TesseraError> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serves requests until `signal` completes, then drains in-flight
    /// requests and returns.
    pub async fn run_with_shutdown<F>(self, signal: F) -> Result<(), TesseraError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(service = self.name, "service running");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;
        tracing::info!(service = self.name, "service stopped");
        Ok(())
    }
}
