//! Plants service
//!
//! Plant creation (with its photo batch), plant cards for the garden list
//! and plant details.

use super::photos::{PhotoBatch, PhotoUpload, PhotosService};
use super::progress::{age_in_days, smart_progress};
use crate::config::MAX_PLANT_NAME_LENGTH;
use crate::database::{
    CreatePlantRequest, LogStore, Measurement, Plant, PlantDetails, PlantPhoto, PlantStatus,
    PlantStore, TaxonomyStore,
};
use crate::error::{AppError, Result};
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Plant form as submitted by the front-end
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPlantForm {
    #[serde(default)]
    pub name: String,
    pub variety_id: Option<String>,
    pub custom_variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewPlantForm {
    /// Check the form and the number of attached photos without touching
    /// any store
    pub fn validate(&self, photo_count: usize) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "Le nom de la plante est requis"));
        }
        if name.chars().count() > MAX_PLANT_NAME_LENGTH {
            return Err(AppError::validation(
                "name",
                format!("Le nom ne doit pas dépasser {} caractères", MAX_PLANT_NAME_LENGTH),
            ));
        }

        let has_variety = self
            .variety_id
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
        let has_custom = self
            .custom_variety
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
        if !has_variety && !has_custom {
            return Err(AppError::validation(
                "variety",
                "Choisissez une variété ou saisissez une variété personnalisée",
            ));
        }

        if let Some(price) = self.purchase_price {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::validation(
                    "purchase_price",
                    "Le prix d'achat doit être un nombre positif",
                ));
            }
        }

        PhotosService::check_batch_size(photo_count)
    }

    fn into_request(self) -> CreatePlantRequest {
        CreatePlantRequest {
            name: self.name.trim().to_string(),
            variety_id: non_empty(self.variety_id),
            custom_variety: non_empty(self.custom_variety),
            planting_date: self.planting_date,
            location: non_empty(self.location),
            purchase_price: self.purchase_price,
            notes: non_empty(self.notes),
            status: PlantStatus::Healthy,
        }
    }
}

/// Result of a plant creation
#[derive(Debug, Clone, Serialize)]
pub struct PlantCreated {
    #[serde(flatten)]
    pub plant: Plant,
    pub photos: Vec<PlantPhoto>,
    /// Photos that could not be stored; the plant exists regardless
    pub failed_uploads: usize,
}

/// View-ready summary of a plant for the garden list
#[derive(Debug, Clone, Serialize)]
pub struct PlantCard {
    #[serde(flatten)]
    pub plant: Plant,
    pub variety: Option<String>,
    pub primary_photo_url: Option<String>,
    pub photo_count: usize,
    pub age_days: Option<i64>,
    pub latest_measurement: Option<Measurement>,
    pub smart_progress: i64,
}

impl PlantCard {
    fn build(details: PlantDetails, latest: Option<Measurement>, today: NaiveDate) -> Self {
        let variety = details.variety_label();
        let primary_photo_url = details.primary_photo().map(|p| p.photo_url.clone());
        let plant = details.plant;

        Self {
            variety,
            primary_photo_url,
            photo_count: details.photos.len(),
            age_days: plant.planting_date.map(|d| age_in_days(d, today)),
            smart_progress: smart_progress(
                plant.planting_date,
                latest.as_ref().and_then(|m| m.height),
                plant.status,
                today,
            ),
            latest_measurement: latest,
            plant,
        }
    }
}

/// Service for managing plants
#[derive(Clone)]
pub struct PlantsService {
    plants: Arc<dyn PlantStore>,
    logs: Arc<dyn LogStore>,
    taxonomy: Arc<dyn TaxonomyStore>,
    photos: PhotosService,
}

impl PlantsService {
    pub fn new(
        plants: Arc<dyn PlantStore>,
        logs: Arc<dyn LogStore>,
        taxonomy: Arc<dyn TaxonomyStore>,
        photos: PhotosService,
    ) -> Self {
        Self {
            plants,
            logs,
            taxonomy,
            photos,
        }
    }

    /// Create a plant for `user_id` and attach its photos.
    ///
    /// The form is validated before any store call. Photo failures are
    /// counted in the result and never undo the plant.
    pub async fn create_plant(
        &self,
        user_id: &str,
        form: NewPlantForm,
        uploads: Vec<PhotoUpload>,
    ) -> Result<PlantCreated> {
        let upload_count = uploads.len();
        form.validate(upload_count)?;

        let req = form.into_request();
        if let Some(variety_id) = &req.variety_id {
            if self.taxonomy.get_variety(variety_id).await?.is_none() {
                return Err(AppError::validation("variety", "Variété inconnue"));
            }
        }

        tracing::info!("Creating plant: {} for user: {}", req.name, user_id);

        let plant = self.plants.insert_plant(user_id, req).await?;

        let batch = match self.photos.attach(user_id, &plant.id, uploads).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Photo batch for plant {} failed: {}", plant.id, e);
                PhotoBatch {
                    photos: Vec::new(),
                    failed: upload_count,
                }
            }
        };

        tracing::info!("Plant created successfully: {}", plant.id);

        Ok(PlantCreated {
            plant,
            photos: batch.photos,
            failed_uploads: batch.failed,
        })
    }

    pub async fn get_plant(&self, user_id: &str, plant_id: &str) -> Result<PlantDetails> {
        self.plants.get_plant(user_id, plant_id).await
    }

    /// Plants of `user_id` as cards, newest first
    pub async fn list_plants(&self, user_id: &str) -> Result<Vec<PlantCard>> {
        let plants = self.plants.list_plants(user_id).await?;
        let today = Utc::now().date_naive();

        let latest = try_join_all(
            plants
                .iter()
                .map(|p| self.logs.list_measurements(&p.plant.id, Some(1))),
        )
        .await?;

        Ok(plants
            .into_iter()
            .zip(latest)
            .map(|(details, mut measurements)| {
                PlantCard::build(details, measurements.pop(), today)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, CreateMeasurementRequest, Repository};
    use crate::services::photos::tests::FixedPrimaryCheck;
    use crate::storage::BlobStore;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn create_test_service() -> (PlantsService, Repository, TempDir) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        let temp = TempDir::new().unwrap();
        let storage = BlobStore::new(temp.path().to_path_buf(), "http://localhost/storage");

        let store = Arc::new(repo.clone());
        let photos = PhotosService::new(store.clone(), Arc::new(storage));
        let service = PlantsService::new(store.clone(), store.clone(), store, photos);
        (service, repo, temp)
    }

    fn form(name: &str) -> NewPlantForm {
        NewPlantForm {
            name: name.to_string(),
            variety_id: Some("var-tomate".to_string()),
            planting_date: Some(Utc::now().date_naive() - chrono::Duration::days(60)),
            location: Some("  Balcon ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(form("Tomate").validate(0).is_ok());
        assert!(matches!(
            form("  ").validate(0),
            Err(AppError::Validation { field: "name", .. })
        ));

        let no_variety = NewPlantForm {
            name: "Tomate".to_string(),
            custom_variety: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            no_variety.validate(0),
            Err(AppError::Validation { field: "variety", .. })
        ));

        let custom_only = NewPlantForm {
            name: "Tomate".to_string(),
            custom_variety: Some("Cœur de bœuf".to_string()),
            ..Default::default()
        };
        assert!(custom_only.validate(5).is_ok());
        assert!(custom_only.validate(6).is_err());

        let negative = NewPlantForm {
            purchase_price: Some(-1.0),
            ..form("Tomate")
        };
        assert!(negative.validate(0).is_err());
    }

    #[tokio::test]
    async fn test_create_plant_without_photos() {
        let (service, repo, _temp) = create_test_service().await;

        let created = service.create_plant("user-1", form(" Tomate "), vec![]).await.unwrap();
        assert_eq!(created.plant.name, "Tomate");
        assert_eq!(created.plant.location.as_deref(), Some("Balcon"));
        assert_eq!(created.plant.status, PlantStatus::Healthy);
        assert_eq!(created.plant.growth, 0);
        assert!(created.photos.is_empty());

        assert!(repo.list_photos(&created.plant.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_photo_batch_counts_every_upload() {
        let (_service, repo, temp) = create_test_service().await;

        let broken = FixedPrimaryCheck {
            inner: repo.clone(),
            answer: None,
        };
        let storage = BlobStore::new(temp.path().to_path_buf(), "http://localhost/storage");
        let photos = PhotosService::new(Arc::new(broken), Arc::new(storage));
        let store = Arc::new(repo.clone());
        let service = PlantsService::new(store.clone(), store.clone(), store, photos);

        let uploads = (0..3)
            .map(|i| PhotoUpload {
                filename: Some(format!("{}.jpg", i)),
                content_type: Some("image/jpeg".to_string()),
                data: vec![i],
            })
            .collect();
        let created = service.create_plant("user-1", form("Tomate"), uploads).await.unwrap();

        assert!(created.photos.is_empty());
        assert_eq!(created.failed_uploads, 3);
        assert!(repo.get_plant("user-1", &created.plant.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_variety_rejected() {
        let (service, repo, _temp) = create_test_service().await;

        let bad = NewPlantForm {
            variety_id: Some("var-nope".to_string()),
            ..form("Tomate")
        };
        let result = service.create_plant("user-1", bad, vec![]).await;
        assert!(matches!(result, Err(AppError::Validation { field: "variety", .. })));
        assert!(repo.list_plants("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_plants_builds_cards() {
        let (service, repo, _temp) = create_test_service().await;

        let created = service
            .create_plant(
                "user-1",
                form("Tomate"),
                vec![PhotoUpload {
                    filename: Some("tomate.jpg".to_string()),
                    content_type: Some("image/jpeg".to_string()),
                    data: b"jpeg".to_vec(),
                }],
            )
            .await
            .unwrap();

        repo.insert_measurement(CreateMeasurementRequest {
            plant_id: created.plant.id.clone(),
            height: Some(40.0),
            width: Some(10.0),
            notes: None,
            measurement_date: Utc::now(),
        })
        .await
        .unwrap();

        let cards = service.list_plants("user-1").await.unwrap();
        assert_eq!(cards.len(), 1);

        let card = &cards[0];
        assert_eq!(card.variety.as_deref(), Some("Tomate"));
        assert_eq!(card.photo_count, 1);
        assert!(card.primary_photo_url.is_some());
        assert_eq!(card.age_days, Some(60));
        // max(50%, 80%) * 1.1
        assert_eq!(card.smart_progress, 88);
        assert_eq!(card.latest_measurement.as_ref().and_then(|m| m.height), Some(40.0));

        assert!(service.list_plants("user-2").await.unwrap().is_empty());
    }
}
