use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur when reading or writing local storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keys persisted on the device
pub struct StorageKeys;

impl StorageKeys {
    pub const SESSION_ID: &'static str = "@moy_risk_session_id";
    pub const LAST_RESULT: &'static str = "@moy_risk_last_result";
    pub const API_CACHE: &'static str = "@moy_risk_api_cache";
}

enum Backend {
    File(PathBuf),
    Memory(Mutex<HashMap<String, String>>),
}

/// String key-value store persisted between runs
///
/// The file backend keeps every key in one JSON object and rewrites it on
/// each change. Access is sequential, so the last write wins.
pub struct LocalStorage {
    backend: Backend,
}

impl LocalStorage {
    /// Storage backed by a JSON file, created on first write
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            backend: Backend::File(path.as_ref().to_path_buf()),
        }
    }

    /// Volatile storage that lives as long as this value
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match &self.backend {
            Backend::File(path) => match tokio::fs::read(path).await {
                Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
                Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
                Err(e) => Err(e.into()),
            },
            Backend::Memory(map) => Ok(map.lock().await.clone()),
        }
    }

    async fn persist(&self, items: HashMap<String, String>) -> Result<(), StorageError> {
        match &self.backend {
            Backend::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let json = serde_json::to_vec_pretty(&items)?;
                let tmp = path.with_extension("tmp");
                tokio::fs::write(&tmp, json).await?;
                tokio::fs::rename(&tmp, path).await?;
                Ok(())
            }
            Backend::Memory(map) => {
                *map.lock().await = items;
                Ok(())
            }
        }
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.load().await?;
        items.insert(key.to_string(), value.to_string());
        self.persist(items).await?;
        tracing::trace!("Storage set: {}", key);
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.load().await?;
        if items.remove(key).is_some() {
            self.persist(items).await?;
        }
        Ok(())
    }

    /// Read a JSON-encoded value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a value as JSON
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw).await
    }
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.backend {
            Backend::File(path) => f.debug_struct("LocalStorage").field("file", path).finish(),
            Backend::Memory(_) => f.debug_struct("LocalStorage").field("memory", &true).finish(),
        }
    }
}
