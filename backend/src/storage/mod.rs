//! Storage module
//!
//! Object storage for plant photos. Objects are addressed by a
//! caller-chosen path key and served publicly under a base URL.

pub mod blob_store;

pub use blob_store::BlobStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Extension used when neither the file name nor the content type gives one
const DEFAULT_EXTENSION: &str = "jpg";

/// Object storage backend
///
/// Implementations must be thread-safe (Send + Sync) so uploads can run
/// concurrently.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Public URL under which `key` is served
    fn public_url(&self, key: &str) -> String;
}

/// Build the storage key of an uploaded photo:
/// `{user_id}/{plant_id}/{timestamp_ms}-{hash8}-{nonce8}.{ext}`
///
/// The nonce keeps identical files uploaded in the same millisecond apart.
pub fn storage_key(
    user_id: &str,
    plant_id: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> String {
    let digest = format!("{:x}", Sha256::digest(data));
    let nonce = Uuid::new_v4().simple().to_string();

    format!(
        "{}/{}/{}-{}-{}.{}",
        user_id,
        plant_id,
        Utc::now().timestamp_millis(),
        &digest[..8],
        &nonce[..8],
        extension_for(filename, content_type)
    )
}

fn extension_for(filename: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    content_type
        .and_then(|ct| mime_guess::get_mime_extensions_str(ct))
        .and_then(|exts| {
            // "jpe" sorts before "jpeg"/"jpg" in the mime table
            exts.iter()
                .find(|ext| **ext == "jpg")
                .or_else(|| exts.first())
                .copied()
        })
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}
