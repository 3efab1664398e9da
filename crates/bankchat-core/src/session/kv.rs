//! Key-value backends for the session store.
//!
//! Two implementations are provided:
//! - `FileStore`: a single JSON object file in the per-user data directory
//! - `MemoryStore`: an in-process map for tests and throwaway sessions

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use futures::future::{self, BoxFuture, FutureExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Session file name inside the data directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Stored session is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage.
///
/// `remove_all` must be all-or-nothing: either every listed key is gone
/// afterwards, or the store is left exactly as it was.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    fn remove_all<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), StorageError>>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// All keys live in one JSON object so that multi-key removal is a single
/// file replacement.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store backed by `session.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, key: &str) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Like `load`, but a corrupt file reads as empty so the next write
    /// replaces it. The flag is set when that happened.
    async fn load_for_write(&self, key: &str) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.load(key).await {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Corrupt(reason)) => {
                warn!(path = %self.path.display(), reason = %reason, "Discarding corrupt session file");
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    /// Write to a sibling temp file, sync it, then rename it into place.
    /// The temp file is removed if any step fails.
    async fn persist(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");

        let result: io::Result<()> = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move { Ok(self.load(key).await?.remove(key)) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            let (mut entries, _) = self.load_for_write(key).await?;
            entries.insert(key.to_string(), value.to_string());
            self.persist(key, &entries).await?;
            debug!(key = key, path = %self.path.display(), "Stored value");
            Ok(())
        }
        .boxed()
    }

    fn remove_all<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            let joined = keys.join(",");
            let (mut entries, recovered) = self.load_for_write(&joined).await?;
            let before = entries.len();
            for key in keys {
                entries.remove(*key);
            }
            if entries.len() == before && !recovered {
                return Ok(());
            }
            self.persist(&joined, &entries).await?;
            debug!(keys = %joined, "Removed values");
            Ok(())
        }
        .boxed()
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        let result = self.entries().map(|entries| entries.get(key).cloned());
        future::ready(result).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        let result = self.entries().map(|mut entries| {
            entries.insert(key.to_string(), value.to_string());
        });
        future::ready(result).boxed()
    }

    fn remove_all<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), StorageError>> {
        let result = self.entries().map(|mut entries| {
            for key in keys {
                entries.remove(*key);
            }
        });
        future::ready(result).boxed()
    }
}

// ============================================================================
// Tests
// ============================================================================
