//! Process-wide configuration shared by both services.
//!
//! Built once at startup, validated, wrapped in an `Arc` and handed to the
//! session layer and every route handler. Nothing reads the secret or the
//! cookie name from anywhere else.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tessera_session::{FileStore, MemoryStore, SessionConfig, SharedStore};

use crate::TesseraError;

// ---------------------------------------------------------------------------
// StoreTarget
// ---------------------------------------------------------------------------

/// Where the shared session store lives.
///
/// Parsed from `memory` or `file:<dir>` (also `file://<dir>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// An in-process map. Only shared by services running in one process.
    Memory,
    /// A directory of session files, shared by every process on the host.
    File(PathBuf),
}

impl FromStr for StoreTarget {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "memory" || s == "memory://" {
            return Ok(Self::Memory);
        }
        let dir = s
            .strip_prefix("file://")
            .or_else(|| s.strip_prefix("file:"))
            .ok_or_else(|| {
                TesseraError::Config(format!(
                    "unknown store target {s:?} (expected `memory` or `file:<dir>`)"
                ))
            })?;
        if dir.is_empty() {
            return Err(TesseraError::Config("file store needs a directory".into()));
        }
        Ok(Self::File(PathBuf::from(dir)))
    }
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File(dir) => write!(f, "file:{}", dir.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// TesseraConfig
// ---------------------------------------------------------------------------

/// Everything both services must agree on, plus where each one listens.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tessera::TesseraConfig;
///
/// let config = TesseraConfig::new("a shared secret")
///     .cookie_name("app.sid")
///     .ttl(Duration::from_secs(600))
///     .backend_url("http://10.0.0.2:3001");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TesseraConfig {
    /// Cookie name, signing secret and record TTL.
    pub session: SessionConfig,
    /// Which store both services read and write.
    pub store: StoreTarget,
    /// Address the front end binds. Default `127.0.0.1:3000`.
    pub frontend_addr: String,
    /// Address the back end binds. Default `127.0.0.1:3001`.
    pub backend_addr: String,
    /// Base URL the front end calls the back end at.
    /// Default `http://127.0.0.1:3001`.
    pub backend_url: String,
    /// Bound on each front-end → back-end call. Default 5 seconds.
    pub upstream_timeout: Duration,
}

impl TesseraConfig {
    /// Creates a config with the given secret and defaults for the rest.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            session: SessionConfig {
                secret: secret.into(),
                ..SessionConfig::default()
            },
            store: StoreTarget::Memory,
            frontend_addr: "127.0.0.1:3000".to_string(),
            backend_addr: "127.0.0.1:3001".to_string(),
            backend_url: "http://127.0.0.1:3001".to_string(),
            upstream_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the session cookie name.
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session.cookie_name = name.into();
        self
    }

    /// Sets the idle lifetime of stored sessions.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.session.ttl = ttl;
        self
    }

    /// Sets the store both services share.
    pub fn store(mut self, store: StoreTarget) -> Self {
        self.store = store;
        self
    }

    /// Sets the front end's bind address.
    pub fn frontend_addr(mut self, addr: impl Into<String>) -> Self {
        self.frontend_addr = addr.into();
        self
    }

    /// Sets the back end's bind address.
    pub fn backend_addr(mut self, addr: impl Into<String>) -> Self {
        self.backend_addr = addr.into();
        self
    }

    /// Sets the URL the front end calls the back end at.
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Sets the bound on each front-end → back-end call.
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Checks the values that would otherwise fail at request time.
    ///
    /// # Errors
    /// [`TesseraError::Config`] if the secret is empty, the cookie name
    /// isn't a valid cookie token, or the TTL or timeout is zero.
    pub fn validate(&self) -> Result<(), TesseraError> {
        if self.session.secret.is_empty() {
            return Err(TesseraError::Config("signing secret is empty".into()));
        }
        if !is_cookie_token(&self.session.cookie_name) {
            return Err(TesseraError::Config(format!(
                "cookie name {:?} is not a valid cookie token",
                self.session.cookie_name
            )));
        }
        if self.session.ttl.is_zero() {
            return Err(TesseraError::Config("session ttl is zero".into()));
        }
        if self.upstream_timeout.is_zero() {
            return Err(TesseraError::Config("upstream timeout is zero".into()));
        }
        Ok(())
    }

    /// Opens the configured store.
    ///
    /// Call this ONCE per process and hand the result to both services: a
    /// memory store opened twice is two unrelated stores. For a memory
    /// store this also starts a task purging expired records once per TTL.
    ///
    /// # Errors
    /// [`TesseraError::Session`] if a file store's directory can't be
    /// created.
    pub async fn open_store(&self) -> Result<SharedStore, TesseraError> {
        let store: SharedStore = match &self.store {
            StoreTarget::Memory => {
                let store = Arc::new(MemoryStore::new(self.session.ttl));
                let _ = store.spawn_reaper(self.session.ttl);
                store as SharedStore
            }
            StoreTarget::File(dir) => {
                let store = FileStore::open(dir.clone(), self.session.ttl).await?;
                Arc::new(store) as SharedStore
            }
        };
        tracing::info!(store = %self.store, ttl = ?self.session.ttl, "session store ready");
        Ok(store)
    }
}

/// RFC 6265 `token`: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}
