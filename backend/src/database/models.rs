//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the front-end.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Health status of a plant as shown on its card
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum PlantStatus {
    #[default]
    Healthy,
    NeedsWater,
    Attention,
}

impl PlantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::NeedsWater => "needs-water",
            Self::Attention => "attention",
        }
    }

    /// French label used in prompts and on cards
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "En bonne santé",
            Self::NeedsWater => "Besoin d'eau",
            Self::Attention => "Attention requise",
        }
    }
}

impl FromStr for PlantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Self::Healthy),
            "needs-water" => Ok(Self::NeedsWater),
            "attention" => Ok(Self::Attention),
            other => Err(format!("unknown plant status: {}", other)),
        }
    }
}

/// A tracked garden item owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plant {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub variety_id: Option<String>,
    pub custom_variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    /// Stored growth percentage, 0-100
    pub growth: i64,
    pub status: PlantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plant row joined with its variety name
#[derive(Debug, Clone, FromRow)]
pub struct PlantRow {
    #[sqlx(flatten)]
    pub plant: Plant,
    pub variety_name: Option<String>,
}

/// Plant with the related rows needed for display
#[derive(Debug, Clone, Serialize)]
pub struct PlantDetails {
    #[serde(flatten)]
    pub plant: Plant,
    pub variety_name: Option<String>,
    pub photos: Vec<PlantPhoto>,
}

impl PlantDetails {
    /// Label describing the variety: taxonomy name, custom text, or both
    pub fn variety_label(&self) -> Option<String> {
        let custom = self
            .plant
            .custom_variety
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match (self.variety_name.as_deref(), custom) {
            (Some(name), Some(custom)) if name != custom => Some(format!("{} ({})", name, custom)),
            (Some(name), _) => Some(name.to_string()),
            (None, Some(custom)) => Some(custom.to_string()),
            (None, None) => None,
        }
    }

    pub fn primary_photo(&self) -> Option<&PlantPhoto> {
        self.photos.iter().find(|p| p.is_primary)
    }
}

/// Create plant request
#[derive(Debug, Clone)]
pub struct CreatePlantRequest {
    pub name: String,
    pub variety_id: Option<String>,
    pub custom_variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
    pub status: PlantStatus,
}

/// Photo attached to a plant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlantPhoto {
    pub id: String,
    pub plant_id: String,
    /// Public URL served by the object storage
    pub photo_url: String,
    /// Object-storage key the URL was derived from
    pub storage_key: Option<String>,
    pub description: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Create photo request
#[derive(Debug, Clone)]
pub struct CreatePhotoRequest {
    pub plant_id: String,
    pub photo_url: String,
    pub storage_key: Option<String>,
    pub description: Option<String>,
    pub is_primary: bool,
}

/// Growth measurement, append-only
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Measurement {
    pub id: String,
    pub plant_id: String,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Width in centimeters
    pub width: Option<f64>,
    pub notes: Option<String>,
    pub measurement_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMeasurementRequest {
    pub plant_id: String,
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub notes: Option<String>,
    pub measurement_date: DateTime<Utc>,
}

/// Watering event, append-only
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WateringRecord {
    pub id: String,
    pub plant_id: String,
    /// Amount in milliliters
    pub amount: f64,
    pub notes: Option<String>,
    pub watering_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateWateringRequest {
    pub plant_id: String,
    pub amount: f64,
    pub notes: Option<String>,
    pub watering_date: DateTime<Utc>,
}

/// Top level of the plant taxonomy
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlantCategory {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Variety listed under a category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlantVariety {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// Free-text address, "street, city, country" by convention
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert profile request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar_url: Option<String>,
}
