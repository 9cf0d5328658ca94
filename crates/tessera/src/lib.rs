//! # Tessera
//!
//! Signed session propagation between two HTTP services.
//!
//! A front-end service owns the user-facing flow: it loads the browser's
//! session, counts the page view, saves the record, and only then calls a
//! back-end service with the session id signed under a shared secret. The
//! back end verifies the signature, reloads the same record from the
//! shared store, and serves protected data only if the record says the
//! user logged in.
//!
//! ```text
//! browser ──GET /──→ frontend ──save──→ store
//!                       │                 ↑
//!                       └─GET /api───→ backend (verify token, reload record)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera::prelude::*;
//!
//! # async fn run() -> Result<(), TesseraError> {
//! let config = Arc::new(TesseraConfig::new("a shared secret"));
//! let store = config.open_store().await?;
//!
//! let backend = Service::backend(Arc::clone(&config), Arc::clone(&store)).await?;
//! let frontend = Service::frontend(
//!     Arc::clone(&config),
//!     store,
//!     StaticAuthenticator::new().with_user("ada", "lovelace"),
//! )
//! .await?;
//!
//! tokio::try_join!(backend.run(), frontend.run())?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod config;
mod error;
pub mod frontend;
mod page;
mod server;
mod session_layer;

pub use config::{StoreTarget, TesseraConfig};
pub use error::TesseraError;
pub use page::render_index;
pub use server::{init_tracing, Service};
pub use session_layer::{LoadedSession, SessionLayer};

pub mod prelude {
    //! Everything needed to wire up both services.

    pub use crate::backend::{BackendState, GateDecision};
    pub use crate::frontend::FrontendState;
    pub use crate::{
        init_tracing, LoadedSession, Service, SessionLayer, StoreTarget,
        TesseraConfig, TesseraError,
    };
    pub use tessera_protocol::{ApiViews, LoginRequest, PageModel, StatusBody};
    pub use tessera_session::{
        Authenticator, FileStore, MemoryStore, SessionConfig, SessionError,
        SessionId, SessionRecord, SessionStore, SharedStore,
        StaticAuthenticator,
    };
    pub use tessera_token::{sign, verify, VerificationFailure};
    pub use tessera_transport::{HttpUpstream, TransportError};
}
