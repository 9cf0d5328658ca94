//! Directory-backed session store.
//!
//! One file per session, `<dir>/<id>.json`, holding the record and its
//! absolute expiry time. Any process on the host that opens the same
//! directory sees the same sessions, which is what lets a front end and a
//! back end run as separate processes.
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! reader never sees half a record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tessera_protocol::{Codec, JsonCodec};

use crate::{SessionError, SessionId, SessionRecord, SessionStore};

const EXTENSION: &str = "json";
/// Extension of a file set aside by `purge_expired`.
const REAPING: &str = "reaping";

/// What a session file contains.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    /// Unix time in milliseconds after which the record is gone.
    expires_at_ms: u64,
    record: SessionRecord,
}

/// A [`SessionStore`] keeping one encoded file per session in a directory.
///
/// Expiry uses wall-clock time because the deadline has to mean the same
/// thing to every process reading the file.
#[derive(Debug, Clone)]
pub struct FileStore<C: Codec = JsonCodec> {
    dir: PathBuf,
    codec: C,
    default_ttl: Duration,
}

impl FileStore<JsonCodec> {
    /// Opens (creating if needed) a JSON-encoded store in `dir`.
    ///
    /// # Errors
    /// Returns [`SessionError::StoreUnavailable`] if the directory can't be
    /// created.
    pub async fn open(
        dir: impl Into<PathBuf>,
        default_ttl: Duration,
    ) -> Result<Self, SessionError> {
        Self::with_codec(dir, JsonCodec, default_ttl).await
    }
}

impl<C: Codec> FileStore<C> {
    /// Opens a store in `dir` that encodes records with `codec`.
    pub async fn with_codec(
        dir: impl Into<PathBuf>,
        codec: C,
        default_ttl: Duration,
    ) -> Result<Self, SessionError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(SessionError::StoreUnavailable)?;
        tracing::info!(dir = %dir.display(), "file session store opened");
        Ok(Self {
            dir,
            codec,
            default_ttl,
        })
    }

    /// The directory sessions are kept in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deletes every expired session file and returns how many went.
    ///
    /// Files that can't be read or decoded are left alone.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(SessionError::StoreUnavailable)?;
        let mut purged = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(SessionError::StoreUnavailable)?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if self.is_expired_file(&path).await && self.reap(&path).await {
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::debug!(count = purged, "purged expired session files");
        }
        Ok(purged)
    }

    async fn is_expired_file(&self, path: &Path) -> bool {
        let Ok(bytes) = tokio::fs::read(path).await else {
            return false;
        };
        self.codec
            .decode::<StoredEntry>(&bytes)
            .is_ok_and(|stored| stored.expires_at_ms <= now_ms())
    }

    /// Removes an expired session file without losing a write that lands
    /// while it's being removed.
    ///
    /// The file is first renamed aside, which is atomic, and only the
    /// renamed copy is judged. If a `set` replaced it between the check
    /// and the rename, the copy is live and is linked back, unless an even
    /// newer write has already taken the name.
    async fn reap(&self, path: &Path) -> bool {
        let suffix: u64 = rand::rng().random();
        let aside = path.with_extension(format!("{suffix:016x}.{REAPING}"));
        if tokio::fs::rename(path, &aside).await.is_err() {
            return false;
        }

        let expired = self.is_expired_file(&aside).await;
        if !expired {
            match tokio::fs::hard_link(&aside, path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "could not restore a live session file"
                    );
                    return false;
                }
            }
        }
        let _ = tokio::fs::remove_file(&aside).await;
        expired
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn write(
        &self,
        id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        if !id.is_well_formed() {
            return Err(SessionError::MalformedId);
        }

        let stored = StoredEntry {
            expires_at_ms: now_ms().saturating_add(ttl.as_millis() as u64),
            record: record.clone(),
        };
        let bytes = self.codec.encode(&stored)?;

        let suffix: u64 = rand::rng().random();
        let tmp = self.dir.join(format!("{id}.{suffix:016x}.tmp"));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(SessionError::StoreUnavailable)?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(id)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(SessionError::StoreUnavailable(e));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Codec> SessionStore for FileStore<C> {
    async fn get(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRecord>, SessionError> {
        // No file can exist for an id this store would never write.
        if !id.is_well_formed() {
            return Ok(None);
        }

        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::StoreUnavailable(e)),
        };

        // Expired files stay on disk until `purge_expired` takes them.
        let stored: StoredEntry = self.codec.decode(&bytes)?;
        if stored.expires_at_ms <= now_ms() {
            return Ok(None);
        }
        Ok(Some(stored.record))
    }

    async fn set(
        &self,
        id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.write(id, record, ttl).await?;
        tracing::trace!(session_id = %id, "session file written");
        Ok(())
    }

    async fn create(&self) -> Result<SessionId, SessionError> {
        let mut id = SessionId::generate();
        while tokio::fs::try_exists(self.path_for(&id))
            .await
            .map_err(SessionError::StoreUnavailable)?
        {
            id = SessionId::generate();
        }

        self.write(&id, &SessionRecord::default(), self.default_ttl)
            .await?;
        tracing::debug!(session_id = %id, "session created");
        Ok(id)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
