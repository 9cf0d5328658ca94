//! In-process session store.
//!
//! Good for tests and for running both services inside one process. Two
//! separate processes need [`FileStore`](crate::FileStore) instead.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{SessionError, SessionId, SessionRecord, SessionStore};

/// One stored record and the moment it stops being visible.
#[derive(Debug)]
struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A [`SessionStore`] backed by a `HashMap` behind a Tokio mutex.
///
/// ## Lifecycle of an entry
///
/// ```text
/// create() / set() ──→ [live] ──(ttl elapses)──→ [expired] ──→ purge_expired()
///        ↑                │                          │
///        └────(set)───────┘                    invisible to get()
/// ```
///
/// Expired entries are hidden from [`get`](SessionStore::get) the instant
/// their TTL passes, whether or not they've been purged yet.
/// [`purge_expired`](Self::purge_expired) frees the memory; call it
/// periodically or let [`spawn_reaper`](Self::spawn_reaper) do it.
///
/// Uses `tokio::time::Instant`, so tests can pause and advance the clock.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<SessionId, Entry>>,
    default_ttl: Duration,
}

impl MemoryStore {
    /// Creates an empty store. `default_ttl` applies to records made by
    /// [`create`](SessionStore::create).
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Removes every expired entry and returns their ids.
    pub async fn purge_expired(&self) -> Vec<SessionId> {
        let now = Instant::now();
        let mut purged = Vec::new();

        self.entries.lock().await.retain(|id, entry| {
            if entry.is_expired(now) {
                purged.push(id.clone());
                false
            } else {
                true
            }
        });

        if !purged.is_empty() {
            tracing::debug!(count = purged.len(), "purged expired sessions");
        }
        purged
    }

    /// Spawns a task that calls [`purge_expired`](Self::purge_expired)
    /// every `every`. The task stops on its own once the store is dropped.
    pub fn spawn_reaper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.purge_expired().await;
            }
        })
    }

    /// Number of entries held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// `true` if the store holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, SessionError> {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        Ok(entries
            .get(id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.record.clone()))
    }

    async fn set(
        &self,
        id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let entry = Entry {
            record: record.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(id.clone(), entry);
        tracing::trace!(session_id = %id, "session stored");
        Ok(())
    }

    async fn create(&self) -> Result<SessionId, SessionError> {
        let mut entries = self.entries.lock().await;

        let mut id = SessionId::generate();
        while entries.contains_key(&id) {
            id = SessionId::generate();
        }

        entries.insert(
            id.clone(),
            Entry {
                record: SessionRecord::default(),
                expires_at: Instant::now() + self.default_ttl,
            },
        );
        tracing::debug!(session_id = %id, "session created");
        Ok(id)
    }
}
