//! Filesystem key-value backend.
//!
//! One file per key, named by the SHA-256 of the key so arbitrary key text maps to
//! a safe file name. Each file holds a small JSON record carrying the original key,
//! which lets [`KvBackend::keys`] enumerate without an index.

use crate::KvBackend;
use jobfit_error::{JobfitResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    key: String,
    value: String,
}

/// Filesystem backend rooted at a directory.
///
/// Writes go to a temporary file and are renamed into place, so readers never see
/// a partially written record.
#[derive(Debug, Clone)]
pub struct FileKv {
    base_path: PathBuf,
}

impl FileKv {
    /// Create a backend, creating the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> JobfitResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created file-backed cache store");
        Ok(Self { base_path })
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.base_path
            .join(format!("{}.{}", hash, RECORD_EXTENSION))
    }

    async fn read_record(path: &Path) -> JobfitResult<Option<Record>> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::Read(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };
        let record = serde_json::from_str(&raw).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(Some(record))
    }
}

#[async_trait::async_trait]
impl KvBackend for FileKv {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> JobfitResult<Option<String>> {
        let path = self.path_for(key);
        Ok(Self::read_record(&path)
            .await?
            .filter(|record| record.key == key)
            .map(|record| record.value))
    }

    #[tracing::instrument(skip(self, value), fields(size = value.len()))]
    async fn set(&self, key: &str, value: &str) -> JobfitResult<()> {
        let path = self.path_for(key);
        let record = Record {
            key: key.to_string(),
            value: value.to_string(),
        };
        let body = serde_json::to_vec(&record).map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!("encode {}: {}", key, e)))
        })?;

        let temp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        tokio::fs::write(&temp_path, &body).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into());
        }

        tracing::debug!(path = %path.display(), "Stored record");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> JobfitResult<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::new(StorageErrorKind::Remove(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn keys(&self) -> JobfitResult<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::List(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })?;

        let mut keys = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::List(e.to_string())).into());
                }
            };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(record)) => keys.push(record.key),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
        Ok(keys)
    }
}
