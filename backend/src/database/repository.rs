//! Repository layer for database operations
//!
//! SQLite implementation of the store traits. Every query that touches a
//! plant is scoped by the owning user id.

use super::models::*;
use super::store::{LogStore, PlantStore, ProfileStore, TaxonomyStore};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlantStore for Repository {
    async fn insert_plant(&self, user_id: &str, req: CreatePlantRequest) -> Result<Plant> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let plant = sqlx::query_as::<_, Plant>(
            r#"
            INSERT INTO plants (
                id, user_id, name, variety_id, custom_variety, planting_date,
                location, purchase_price, notes, growth, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.variety_id)
        .bind(&req.custom_variety)
        .bind(req.planting_date)
        .bind(&req.location)
        .bind(req.purchase_price)
        .bind(&req.notes)
        .bind(req.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created plant: {} for user: {}", id, user_id);
        Ok(plant)
    }

    async fn get_plant(&self, user_id: &str, plant_id: &str) -> Result<PlantDetails> {
        let row = sqlx::query_as::<_, PlantRow>(
            r#"
            SELECT p.*, v.name AS variety_name
            FROM plants p
            LEFT JOIN plant_varieties v ON v.id = p.variety_id
            WHERE p.id = ? AND p.user_id = ?
            "#,
        )
        .bind(plant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::PlantNotFound(plant_id.to_string()))?;

        let photos = self.list_photos(plant_id).await?;

        Ok(PlantDetails {
            plant: row.plant,
            variety_name: row.variety_name,
            photos,
        })
    }

    async fn list_plants(&self, user_id: &str) -> Result<Vec<PlantDetails>> {
        let rows = sqlx::query_as::<_, PlantRow>(
            r#"
            SELECT p.*, v.name AS variety_name
            FROM plants p
            LEFT JOIN plant_varieties v ON v.id = p.variety_id
            WHERE p.user_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let photos = sqlx::query_as::<_, PlantPhoto>(
            r#"
            SELECT ph.* FROM plant_photos ph
            JOIN plants p ON p.id = ph.plant_id
            WHERE p.user_id = ?
            ORDER BY ph.is_primary DESC, ph.created_at ASC, ph.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_plant: HashMap<String, Vec<PlantPhoto>> = HashMap::new();
        for photo in photos {
            by_plant.entry(photo.plant_id.clone()).or_default().push(photo);
        }

        Ok(rows
            .into_iter()
            .map(|row| PlantDetails {
                photos: by_plant.remove(&row.plant.id).unwrap_or_default(),
                plant: row.plant,
                variety_name: row.variety_name,
            })
            .collect())
    }

    async fn insert_photo(&self, req: CreatePhotoRequest) -> Result<PlantPhoto> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let photo = sqlx::query_as::<_, PlantPhoto>(
            r#"
            INSERT INTO plant_photos (id, plant_id, photo_url, storage_key, description, is_primary, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.plant_id)
        .bind(&req.photo_url)
        .bind(&req.storage_key)
        .bind(&req.description)
        .bind(req.is_primary)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created photo: {} for plant: {}", id, req.plant_id);
        Ok(photo)
    }

    async fn list_photos(&self, plant_id: &str) -> Result<Vec<PlantPhoto>> {
        let photos = sqlx::query_as::<_, PlantPhoto>(
            r#"
            SELECT * FROM plant_photos
            WHERE plant_id = ?
            ORDER BY is_primary DESC, created_at ASC, id ASC
            "#,
        )
        .bind(plant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn has_primary_photo(&self, plant_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM plant_photos WHERE plant_id = ? AND is_primary = 1",
        )
        .bind(plant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl LogStore for Repository {
    async fn insert_measurement(&self, req: CreateMeasurementRequest) -> Result<Measurement> {
        let id = Uuid::new_v4().to_string();

        let measurement = sqlx::query_as::<_, Measurement>(
            r#"
            INSERT INTO plant_measurements (id, plant_id, height, width, notes, measurement_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.plant_id)
        .bind(req.height)
        .bind(req.width)
        .bind(&req.notes)
        .bind(req.measurement_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created measurement: {} for plant: {}", id, req.plant_id);
        Ok(measurement)
    }

    async fn list_measurements(
        &self,
        plant_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Measurement>> {
        // SQLite treats a negative LIMIT as "no limit"
        let measurements = sqlx::query_as::<_, Measurement>(
            r#"
            SELECT * FROM plant_measurements
            WHERE plant_id = ?
            ORDER BY measurement_date DESC, created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(plant_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(measurements)
    }

    async fn insert_watering(&self, req: CreateWateringRequest) -> Result<WateringRecord> {
        let id = Uuid::new_v4().to_string();

        let record = sqlx::query_as::<_, WateringRecord>(
            r#"
            INSERT INTO plant_watering (id, plant_id, amount, notes, watering_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.plant_id)
        .bind(req.amount)
        .bind(&req.notes)
        .bind(req.watering_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created watering record: {} for plant: {}", id, req.plant_id);
        Ok(record)
    }

    async fn list_waterings(&self, plant_id: &str) -> Result<Vec<WateringRecord>> {
        let records = sqlx::query_as::<_, WateringRecord>(
            r#"
            SELECT * FROM plant_watering
            WHERE plant_id = ?
            ORDER BY watering_date DESC, created_at DESC, id DESC
            "#,
        )
        .bind(plant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[async_trait]
impl TaxonomyStore for Repository {
    async fn list_categories(&self) -> Result<Vec<PlantCategory>> {
        let categories = sqlx::query_as::<_, PlantCategory>(
            "SELECT * FROM plant_categories ORDER BY name COLLATE NOCASE ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn list_varieties(&self, category_id: &str) -> Result<Vec<PlantVariety>> {
        let varieties = sqlx::query_as::<_, PlantVariety>(
            r#"
            SELECT * FROM plant_varieties
            WHERE category_id = ?
            ORDER BY name COLLATE NOCASE ASC, id ASC
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(varieties)
    }

    async fn get_variety(&self, variety_id: &str) -> Result<Option<PlantVariety>> {
        let variety = sqlx::query_as::<_, PlantVariety>("SELECT * FROM plant_varieties WHERE id = ?")
            .bind(variety_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(variety)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<PlantCategory>> {
        let category = sqlx::query_as::<_, PlantCategory>(
            "SELECT * FROM plant_categories WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn insert_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<PlantCategory> {
        let id = Uuid::new_v4().to_string();

        let category = sqlx::query_as::<_, PlantCategory>(
            r#"
            INSERT INTO plant_categories (id, name, description, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created category: {} ({})", name, id);
        Ok(category)
    }

    async fn insert_variety(
        &self,
        category_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<PlantVariety> {
        let id = Uuid::new_v4().to_string();

        let variety = sqlx::query_as::<_, PlantVariety>(
            r#"
            INSERT INTO plant_varieties (id, category_id, name, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created variety: {} in category: {}", name, category_id);
        Ok(variety)
    }
}

#[async_trait]
impl ProfileStore for Repository {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn upsert_profile(&self, user_id: &str, req: UpsertProfileRequest) -> Result<Profile> {
        let now = Utc::now();

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (
                id, user_id, full_name, phone, address, latitude, longitude,
                avatar_url, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                full_name = excluded.full_name,
                phone = excluded.phone,
                address = excluded.address,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&req.full_name)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.avatar_url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Upserted profile for user: {}", user_id);
        Ok(profile)
    }
}
