//! Append-only JSON-array collections, one file per collection.
//!
//! Every append loads the whole array, pushes one record and rewrites the file.
//! Appends to the same collection are serialized through a per-collection lock,
//! and the new contents are written to a temp file that is renamed over the
//! original.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Collection '{collection}' is not a valid JSON array: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode collection '{collection}': {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FlatFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the backing file for `collection`.
    pub fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_collection(collection)?;
        Ok(self.root.join(format!("{collection}.json")))
    }

    /// Append `record` to the end of `collection` and return it as stored.
    pub async fn append<T>(&self, collection: &str, record: T) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let path = self.collection_path(collection)?;
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        let mut records: Vec<T> = read_collection(collection, &path).await?;
        records.push(record.clone());
        write_collection(collection, &self.root, &path, &records).await?;

        tracing::debug!(collection, count = records.len(), "appended record");
        Ok(record)
    }

    /// Every record in `collection`, oldest first. A missing file is an empty collection.
    pub async fn list_all<T>(&self, collection: &str) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = self.collection_path(collection)?;
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        read_collection(collection, &path).await
    }

    /// Create the data directory if it is not there yet.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })
    }

    fn lock_for(&self, collection: &str) -> Arc<AsyncMutex<()>> {
        // A poisoned table only means another thread panicked while inserting.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

fn validate_collection(collection: &str) -> Result<(), StoreError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}

async fn read_collection<T: DeserializeOwned>(
    collection: &str,
    path: &Path,
) -> Result<Vec<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        collection: collection.to_string(),
        source,
    })
}

async fn write_collection<T: Serialize>(
    collection: &str,
    root: &Path,
    path: &Path,
    records: &[T],
) -> Result<(), StoreError> {
    let encoded = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Encode {
        collection: collection.to_string(),
        source,
    })?;

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| StoreError::Io {
            path: root.to_path_buf(),
            source,
        })?;

    let tmp = root.join(format!(".{collection}.json.{}.tmp", uuid::Uuid::new_v4().simple()));
    if let Err(source) = tokio::fs::write(&tmp, &encoded).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::Io { path: tmp, source });
    }

    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
