//! Blob storage for chat attachments.
//!
//! The store hands back an opaque `storage_id` that is persisted on the
//! message and used to release the file when the message is deleted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StrideError, StrideResult};

/// Handle returned by an upload: the client-facing URL and the id used
/// for a later delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub url: String,
    pub storage_id: String,
}

/// External file storage boundary.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a folder and file name. Returns the URL and
    /// storage id.
    async fn upload(&self, bytes: &[u8], folder: &str, name: &str) -> StrideResult<StoredBlob>;

    /// Release a previously uploaded file.
    async fn delete(&self, storage_id: &str) -> StrideResult<()>;
}

/// Reject path separators and traversal sequences in a user-supplied
/// path segment.
fn ensure_plain_segment(segment: &str) -> StrideResult<()> {
    if segment.is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains("..")
    {
        return Err(StrideError::Blob(format!(
            "Invalid path segment: {:?}",
            segment
        )));
    }
    Ok(())
}

/// Filesystem blob store. Files land at
/// `{base}/{folder}/{uuid}_{name}`; the storage id is the path
/// relative to the base directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl FsBlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> StrideResult<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StrideError::Blob(format!(
                "Failed to create blob directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), max_size, "Blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, storage_id: &str) -> StrideResult<PathBuf> {
        let (folder, name) = storage_id
            .split_once('/')
            .ok_or_else(|| StrideError::Blob(format!("Invalid storage id: {:?}", storage_id)))?;
        ensure_plain_segment(folder)?;
        ensure_plain_segment(name)?;
        Ok(self.base_path.join(folder).join(name))
    }

    /// Read a stored blob back. Not part of the [`BlobStore`] trait:
    /// serving file contents belongs to whatever fronts the base
    /// directory; this exists for verification.
    pub async fn read(&self, storage_id: &str) -> StrideResult<Vec<u8>> {
        let path = self.resolve(storage_id)?;
        if !path.exists() {
            return Err(StrideError::Blob(format!("Blob not found: {}", storage_id)));
        }
        let data = fs::read(&path)
            .await
            .map_err(|e| StrideError::Blob(format!("Failed to read blob {}: {}", storage_id, e)))?;
        Ok(data)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bytes: &[u8], folder: &str, name: &str) -> StrideResult<StoredBlob> {
        if bytes.is_empty() {
            return Err(StrideError::Blob("Empty blob".to_string()));
        }
        if bytes.len() > self.max_size {
            return Err(StrideError::Blob(format!(
                "Blob too large: {} bytes, limit is {}",
                bytes.len(),
                self.max_size
            )));
        }
        ensure_plain_segment(folder)?;
        ensure_plain_segment(name)?;

        let storage_id = format!("{}/{}_{}", folder, Uuid::new_v4(), name);
        let path = self.base_path.join(&storage_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StrideError::Blob(format!("Failed to create blob folder {}: {}", folder, e))
            })?;
        }

        fs::write(&path, bytes).await.map_err(|e| {
            StrideError::Blob(format!("Failed to write blob {}: {}", storage_id, e))
        })?;

        debug!(storage_id = %storage_id, size = bytes.len(), "Stored blob");
        Ok(StoredBlob {
            url: format!("/blobs/{}", storage_id),
            storage_id,
        })
    }

    async fn delete(&self, storage_id: &str) -> StrideResult<()> {
        let path = self.resolve(storage_id)?;
        if !path.exists() {
            return Err(StrideError::Blob(format!("Blob not found: {}", storage_id)));
        }
        fs::remove_file(&path).await.map_err(|e| {
            StrideError::Blob(format!("Failed to delete blob {}: {}", storage_id, e))
        })?;

        debug!(storage_id = %storage_id, "Deleted blob");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (FsBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upload_and_read() {
        let (store, _dir) = test_store().await;
        let blob = store
            .upload(b"attachment-bytes", "chat", "report.pdf")
            .await
            .unwrap();

        assert!(blob.storage_id.starts_with("chat/"));
        assert!(blob.storage_id.ends_with("_report.pdf"));
        assert_eq!(blob.url, format!("/blobs/{}", blob.storage_id));

        let data = store.read(&blob.storage_id).await.unwrap();
        assert_eq!(data, b"attachment-bytes");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _dir) = test_store().await;
        let blob = store.upload(b"delete-me", "chat", "x.png").await.unwrap();

        store.delete(&blob.storage_id).await.unwrap();
        assert!(store.read(&blob.storage_id).await.is_err());
        // second delete reports missing
        assert!(store.delete(&blob.storage_id).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_blob_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.upload(b"", "chat", "x.png").await.is_err());
    }

    #[tokio::test]
    async fn test_size_limit_enforced() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf(), 8).await.unwrap();
        assert!(store.upload(b"under", "chat", "ok.bin").await.is_ok());
        assert!(store
            .upload(b"way-over-the-limit", "chat", "no.bin")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.upload(b"x", "../etc", "passwd").await.is_err());
        assert!(store.upload(b"x", "chat", "../../passwd").await.is_err());
        assert!(store.delete("chat/../secret").await.is_err());
        assert!(store.delete("no-slash").await.is_err());
    }
}
