//! Key-value storage the draft snapshot is persisted in.
//!
//! A write needs room for the new value while the previous value under the same key is still
//! held, so removing the previous value first can make an otherwise failing write fit.
use std::{
    fmt, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use primitives::{util::slug::sanitize_file_name, PersistedDraft};
use slog::{error, warn, Logger};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },
    #[error("Storage I/O: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

pub trait LocalStorage: fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn check_quota(quota: Option<u64>, used: u64, value: &str) -> Result<(), StorageError> {
    let quota = match quota {
        Some(quota) => quota,
        None => return Ok(()),
    };
    let needed = value.len() as u64;
    let available = quota.saturating_sub(used);

    if needed > available {
        Err(StorageError::QuotaExceeded { needed, available })
    } else {
        Ok(())
    }
}

/// In-memory storage, counting the bytes of the stored values against the quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    quota: Option<u64>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(quota: Option<u64>) -> Self {
        Self {
            quota,
            ..Default::default()
        }
    }

    /// The bytes currently used by all values
    pub fn used(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.value().len() as u64)
            .sum()
    }

    /// How many writes succeeded
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota, self.used(), value)?;

        self.entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);

        Ok(())
    }
}

/// One `{key}.json` file per key in a directory.
///
/// Values are written to a temporary file first and then renamed over the previous one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileStorage {
    /// Creates the directory if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>, quota: Option<u64>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir, quota })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_name(key)))
    }

    fn used(&self) -> Result<u64, StorageError> {
        let mut used = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let metadata = entry?.metadata()?;
            if metadata.is_file() {
                used += metadata.len();
            }
        }

        Ok(used)
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota, self.used()?, value)?;

        let path = self.path(key);
        let temporary = path.with_extension("json.tmp");
        std::fs::write(&temporary, value)?;
        std::fs::rename(&temporary, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

/// Writes the snapshot under `key`.
///
/// When the quota is exceeded, the previous snapshot is removed and the write is retried once.
/// If the retry fails as well, the previous snapshot is put back.
pub fn save_snapshot(
    storage: &dyn LocalStorage,
    key: &str,
    snapshot: &PersistedDraft,
    logger: &Logger,
) -> Result<(), StorageError> {
    let value = serde_json::to_string(snapshot)?;

    match storage.set(key, &value) {
        Err(error) if error.is_quota_exceeded() => {
            warn!(logger, "Snapshot doesn't fit, retrying without the previous one"; "module" => "storage", "key" => key, "error" => %error);

            let previous = storage.get(key)?;
            storage.remove(key)?;

            let retry = storage.set(key, &value);
            if let (Err(_), Some(previous)) = (&retry, previous) {
                if let Err(restore_error) = storage.set(key, &previous) {
                    error!(logger, "Restoring the previous snapshot failed"; "module" => "storage", "key" => key, "error" => %restore_error);
                }
            }

            retry
        }
        result => result,
    }
}

pub fn load_snapshot(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<PersistedDraft>, StorageError> {
    storage
        .get(key)?
        .map(|value| serde_json::from_str(&value))
        .transpose()
        .map_err(StorageError::from)
}
