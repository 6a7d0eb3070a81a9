//! Key-value blob store adapters.
//!
//! The repository only needs `get`/`set`/`delete` with read-after-write
//! consistency on a single key. Two adapters are provided: an in-memory map
//! for tests and ephemeral deployments, and a directory of files.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ServerConfig, StoreBackend};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create store directory '{path}': {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Build the adapter selected by the configuration.
pub async fn open(config: &ServerConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    let store: Arc<dyn KvStore> = match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory note store (data is lost on restart)");
            Arc::new(MemoryKvStore::new())
        }
        StoreBackend::Fs => Arc::new(FsKvStore::new(config.storage_path.clone()).await?),
    };
    Ok(store)
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// One file per key under `base_path`.
///
/// File names are the hex encoding of the key, so any key maps to a single
/// flat file name and cannot escape the base directory. Writes go to a
/// temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FsKvStore {
    base_path: PathBuf,
}

impl FsKvStore {
    pub async fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_path)
            .await
            .map_err(|source| StoreError::Init {
                path: base_path.clone(),
                source,
            })?;

        info!(path = %base_path.display(), "File note store initialized");

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(hex::encode(key))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl KvStore for FsKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.key_path(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.key_path(key);
        let tmp = self
            .base_path
            .join(format!(".{}.tmp", Uuid::new_v4().simple()));

        fs::write(&tmp, &value).await.map_err(|e| io_error(key, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error(key, e));
        }

        debug!(key, size = value.len(), "Stored record");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.key_path(key)).await {
            Ok(()) => {
                debug!(key, "Deleted record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}
