//! Filesystem object storage
//!
//! Stores each object at `root/<key>`, where the key is a relative
//! slash-separated path such as `user/plant/1718000000000-ab12cd34-5e6f7a8b.jpg`.
//! Writes go through a temp file and a rename so readers never see a
//! partially written photo.

use super::ObjectStorage;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Filesystem-backed object store
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    /// Create a store rooted at `root`, serving objects under `public_base_url`
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Initialize the store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Object store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Resolve a key to a path inside the root. Empty, `.` and `..`
    /// segments are rejected so a key can never escape the root.
    fn get_path(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();

        for segment in key.split('/') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('\\')
                || segment.contains('\0')
            {
                return Err(AppError::Storage(format!("Invalid object key: {}", key)));
            }
            path.push(segment);
        }

        Ok(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

async fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, path).await
}

#[async_trait]
impl ObjectStorage for BlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.get_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a unique temp file first (atomic write)
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = write_then_rename(&temp_path, &path, data).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove temp file {:?}: {}", temp_path, cleanup);
                }
            }
            return Err(e.into());
        }

        tracing::debug!("Stored object: {} ({} bytes)", key, data.len());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.get_path(key)?;

        if !fs::try_exists(&path).await? {
            return Err(AppError::Storage(format!("Object not found: {}", key)));
        }

        let data = fs::read(&path).await?;
        tracing::debug!("Read object: {} ({} bytes)", key, data.len());
        Ok(data)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.get_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.get_path(key)?;

        if !fs::try_exists(&path).await? {
            return Ok(()); // Already deleted
        }

        fs::remove_file(&path).await?;
        tracing::debug!("Deleted object: {}", key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
