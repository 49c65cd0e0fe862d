//! Durable key-value persistence, namespaced per running instance.
//!
//! Records are JSON. Keys are `<name>_<instance>`, so two differently named
//! copies of the launcher never see each other's state.

use crate::error::PersistenceError;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Record name of the pinned item collection.
pub const ITEMS_KEY: &str = "saved_apps";
/// Record name of the display preferences.
pub const SETTINGS_KEY: &str = "saved_settings";

/// Overrides the instance identity.
pub const INSTANCE_ENV: &str = "FOLDERDOCK_INSTANCE";
/// Overrides the directory of the file backend.
pub const STATE_DIR_ENV: &str = "FOLDERDOCK_STATE_DIR";

/// Bytes of the key digest carried in record file names.
const KEY_DIGEST_LEN: usize = 8;

/// Storage underneath the gateway. A write replaces the whole value.
pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;
    fn write(&self, key: &str, value: &[u8]) -> Result<(), PersistenceError>;
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`. Characters unsafe in file names become `_`,
    /// and a digest of the raw key keeps sanitized names apart.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!(
            "{}-{}.json",
            name,
            hex::encode(&digest[..KEY_DIGEST_LEN])
        ))
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a temporary file first, then rename over the old record.
    fn write(&self, key: &str, value: &[u8]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// In-process backend. Counts writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.into());
        }
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Backend("memory backend poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), PersistenceError> {
        let failing = self.failing_writes.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_writes.store(failing - 1, Ordering::SeqCst);
            return Err(PersistenceError::Backend("injected write failure".to_string()));
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Backend("memory backend poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serializes records to and from a backend under instance-scoped keys.
#[derive(Clone)]
pub struct PersistenceGateway {
    backend: Arc<dyn KeyValueBackend>,
    instance: String,
}

impl PersistenceGateway {
    pub fn new(backend: Arc<dyn KeyValueBackend>, instance: impl Into<String>) -> Self {
        Self {
            backend,
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Full backend key of a record name.
    pub fn key(&self, name: &str) -> String {
        format!("{}_{}", name, self.instance)
    }

    /// Serialize and overwrite a record. A failed write is retried once.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, record: &T) -> Result<(), PersistenceError> {
        let key = self.key(name);
        let bytes = serde_json::to_vec_pretty(record)?;

        if let Err(e) = self.backend.write(&key, &bytes) {
            warn!("Write of {} failed ({}), retrying once", key, e);
            self.backend.write(&key, &bytes)?;
        }

        debug!("Saved {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Read a record. Missing, unreadable or undecodable records are `None`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.key(name);
        let bytes = match self.backend.read(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("No record stored under {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cannot read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Discarding corrupt record {}: {}", key, e);
                None
            }
        }
    }
}

/// Identity of the running instance: `FOLDERDOCK_INSTANCE`, or the process name.
pub fn instance_name() -> String {
    if let Ok(name) = std::env::var(INSTANCE_ENV) {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "FolderDock".to_string())
}

/// `FOLDERDOCK_STATE_DIR`, or `$XDG_DATA_HOME/folderdock`.
pub fn default_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folderdock")
}
