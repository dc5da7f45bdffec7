//! Photos service
//!
//! Uploads plant photos to object storage and records them. Uploads of one
//! batch run concurrently and fail independently; rows are inserted in the
//! order uploads complete.

use crate::config::MAX_PHOTOS_PER_PLANT;
use crate::database::{CreatePhotoRequest, PlantPhoto, PlantStore};
use crate::error::{AppError, Result};
use crate::storage::{storage_key, ObjectStorage};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// One file submitted with a plant
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Outcome of an upload batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhotoBatch {
    pub photos: Vec<PlantPhoto>,
    /// Number of files that could not be stored or recorded
    pub failed: usize,
}

/// Service for managing plant photos
#[derive(Clone)]
pub struct PhotosService {
    plants: Arc<dyn PlantStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl PhotosService {
    pub fn new(plants: Arc<dyn PlantStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { plants, storage }
    }

    /// Reject batches above the per-plant cap
    pub fn check_batch_size(count: usize) -> Result<()> {
        if count > MAX_PHOTOS_PER_PLANT {
            return Err(AppError::validation(
                "photos",
                format!("{} photos maximum", MAX_PHOTOS_PER_PLANT),
            ));
        }
        Ok(())
    }

    /// Upload photos for a plant owned by `user_id`
    pub async fn upload_photos(
        &self,
        user_id: &str,
        plant_id: &str,
        uploads: Vec<PhotoUpload>,
    ) -> Result<PhotoBatch> {
        Self::check_batch_size(uploads.len())?;
        self.plants.get_plant(user_id, plant_id).await?;

        self.attach(user_id, plant_id, uploads).await
    }

    /// Store and record a batch for a plant already known to belong to
    /// `user_id`. Individual failures are logged and counted.
    pub(crate) async fn attach(
        &self,
        user_id: &str,
        plant_id: &str,
        uploads: Vec<PhotoUpload>,
    ) -> Result<PhotoBatch> {
        let mut batch = PhotoBatch::default();
        if uploads.is_empty() {
            return Ok(batch);
        }

        tracing::info!("Uploading {} photo(s) for plant: {}", uploads.len(), plant_id);

        let storage = &self.storage;
        let mut pending: FuturesUnordered<_> = uploads
            .into_iter()
            .map(|upload| async move {
                let key = storage_key(
                    user_id,
                    plant_id,
                    upload.filename.as_deref(),
                    upload.content_type.as_deref(),
                    &upload.data,
                );
                match storage.put(&key, &upload.data).await {
                    Ok(()) => Ok(key),
                    Err(e) => Err((upload.filename, e)),
                }
            })
            .collect();

        let mut has_primary = self.plants.has_primary_photo(plant_id).await?;

        while let Some(result) = pending.next().await {
            let key = match result {
                Ok(key) => key,
                Err((filename, e)) => {
                    tracing::warn!("Photo upload failed ({:?}): {}", filename, e);
                    batch.failed += 1;
                    continue;
                }
            };

            let req = CreatePhotoRequest {
                plant_id: plant_id.to_string(),
                photo_url: self.storage.public_url(&key),
                storage_key: Some(key.clone()),
                description: None,
                is_primary: !has_primary,
            };

            match self.insert_photo(req).await {
                Ok(photo) => {
                    has_primary |= photo.is_primary;
                    batch.photos.push(photo);
                }
                Err(e) => {
                    tracing::warn!("Failed to record photo {}: {}", key, e);
                    if let Err(e) = self.storage.delete(&key).await {
                        tracing::warn!("Failed to remove orphaned object {}: {}", key, e);
                    }
                    batch.failed += 1;
                }
            }
        }

        tracing::info!(
            "Photo batch for plant {}: {} stored, {} failed",
            plant_id,
            batch.photos.len(),
            batch.failed
        );

        Ok(batch)
    }

    /// Insert a photo row. If another writer claimed the primary slot in
    /// the meantime, the photo is recorded as non-primary instead.
    async fn insert_photo(&self, req: CreatePhotoRequest) -> Result<PlantPhoto> {
        match self.plants.insert_photo(req.clone()).await {
            Err(AppError::Database(sqlx::Error::Database(db)))
                if req.is_primary && db.is_unique_violation() =>
            {
                tracing::debug!("Primary photo already set for plant: {}", req.plant_id);
                self.plants
                    .insert_photo(CreatePhotoRequest {
                        is_primary: false,
                        ..req
                    })
                    .await
            }
            other => other,
        }
    }

    /// Photos of a plant owned by `user_id`, primary first
    pub async fn list_photos(&self, user_id: &str, plant_id: &str) -> Result<Vec<PlantPhoto>> {
        self.plants.get_plant(user_id, plant_id).await?;
        self.plants.list_photos(plant_id).await
    }

    pub async fn primary_photo(&self, user_id: &str, plant_id: &str) -> Result<Option<PlantPhoto>> {
        let photos = self.list_photos(user_id, plant_id).await?;
        Ok(photos.into_iter().find(|p| p.is_primary))
    }
}
