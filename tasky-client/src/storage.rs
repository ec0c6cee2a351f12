//! Durable blobs for store snapshots.
//!
//! Snapshots are versionless JSON, overwritten on every write and read once
//! when a store is constructed. Stores go through [`load_snapshot`] and
//! [`save_snapshot`], which log failures instead of returning them: a broken
//! disk must never fail the in-memory change that triggered the write.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

pub trait SnapshotStorage: Send + Sync {
    fn load(&self, key: &str) -> ClientResult<Option<String>>;
    fn save(&self, key: &str, blob: &str) -> ClientResult<()>;
}

/// One `<key>.json` file per snapshot inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> ClientResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        let p = self.path_for(key);
        match fs::read_to_string(&p) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> ClientResult<()> {
        let p = self.path_for(key);
        // Write-then-rename so a crash mid-write leaves the previous snapshot.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &p)?;
        debug!(path = %p.display(), bytes = blob.len(), "snapshot written");
        Ok(())
    }
}

/// In-process storage; `fail_writes` simulates a full or read-only disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, key: &str, blob: &str) -> Self {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, blob: &str) -> ClientResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Storage(std::io::Error::other(
                "simulated write failure",
            )));
        }
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Read and decode a snapshot. Missing, unreadable or corrupt → `None`.
pub fn load_snapshot<T: DeserializeOwned>(storage: &dyn SnapshotStorage, key: &str) -> Option<T> {
    let blob = match storage.load(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "could not read snapshot; starting empty");
            return None;
        }
    };
    match serde_json::from_str(&blob) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, error = %e, "corrupt snapshot ignored; starting empty");
            None
        }
    }
}

/// Encode and write a snapshot, logging (not returning) any failure.
pub fn save_snapshot<T: Serialize>(storage: &dyn SnapshotStorage, key: &str, value: &T) {
    let blob = match serde_json::to_string(value) {
        Ok(blob) => blob,
        Err(e) => {
            warn!(key, error = %e, "could not encode snapshot");
            return;
        }
    };
    if let Err(e) = storage.save(key, &blob) {
        warn!(key, error = %e, "could not persist snapshot; in-memory state kept");
    }
}
