//! Session stores: where records live between requests.
//!
//! The [`SessionStore`] trait is the whole contract a service relies on.
//! Stores handle expiry themselves; callers never delete records.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{SessionError, SessionId, SessionRecord};

/// Key-value storage for session records with idle-TTL expiry.
///
/// Implementations must give read-after-write consistency for a single
/// key: once `set` has returned, a `get` from any holder of the store sees
/// the new record. There is no compare-and-swap; concurrent writers to one
/// id race and the last write wins.
///
/// `#[async_trait]` keeps the trait object-safe, so services can hold a
/// [`SharedStore`] chosen at startup.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Loads a record. `Ok(None)` if it never existed or has expired.
    async fn get(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, SessionError>;

    /// Stores (overwrites) a record and restarts its TTL.
    async fn set(
        &self,
        id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Allocates a fresh id holding an empty record.
    async fn create(&self) -> Result<SessionId, SessionError>;
}

/// A store shared by every request task of every service in the process.
pub type SharedStore = Arc<dyn SessionStore>;
