//! Data-access interfaces
//!
//! Services never talk to the database directly: they receive one of these
//! traits so tests can substitute a fake store. `Repository` implements all
//! of them over SQLite.

use async_trait::async_trait;

use super::models::*;
use crate::error::Result;

/// Plant records and their photos, scoped by owner
#[async_trait]
pub trait PlantStore: Send + Sync {
    async fn insert_plant(&self, user_id: &str, req: CreatePlantRequest) -> Result<Plant>;

    /// Fetch one plant of `user_id`; another user's plant is `PlantNotFound`
    async fn get_plant(&self, user_id: &str, plant_id: &str) -> Result<PlantDetails>;

    /// All plants of `user_id` with variety names and photos, newest first
    async fn list_plants(&self, user_id: &str) -> Result<Vec<PlantDetails>>;

    async fn insert_photo(&self, req: CreatePhotoRequest) -> Result<PlantPhoto>;

    /// Photos of a plant, primary first then oldest first
    async fn list_photos(&self, plant_id: &str) -> Result<Vec<PlantPhoto>>;

    async fn has_primary_photo(&self, plant_id: &str) -> Result<bool>;
}

/// Append-only measurement and watering logs
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert_measurement(&self, req: CreateMeasurementRequest) -> Result<Measurement>;

    /// Measurements most recent first, optionally truncated to `limit`
    async fn list_measurements(&self, plant_id: &str, limit: Option<i64>)
        -> Result<Vec<Measurement>>;

    async fn insert_watering(&self, req: CreateWateringRequest) -> Result<WateringRecord>;

    /// Watering records most recent first
    async fn list_waterings(&self, plant_id: &str) -> Result<Vec<WateringRecord>>;
}

/// Category and variety taxonomy
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// All categories sorted by name
    async fn list_categories(&self) -> Result<Vec<PlantCategory>>;

    /// Varieties of one category sorted by name
    async fn list_varieties(&self, category_id: &str) -> Result<Vec<PlantVariety>>;

    async fn get_variety(&self, variety_id: &str) -> Result<Option<PlantVariety>>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<PlantCategory>>;

    async fn insert_category(&self, name: &str, description: Option<&str>)
        -> Result<PlantCategory>;

    async fn insert_variety(
        &self,
        category_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<PlantVariety>;
}

/// User profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Create or update the profile of `user_id`
    async fn upsert_profile(&self, user_id: &str, req: UpsertProfileRequest) -> Result<Profile>;
}
