//! Measurement and watering logs
//!
//! Both logs are append-only. Every write returns the full history, most
//! recent first, re-read from the store.

use super::advice::AdviceService;
use crate::database::{
    CreateMeasurementRequest, CreateWateringRequest, LogStore, Measurement, PlantStore,
    WateringRecord,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Measurement form, sizes in centimeters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementForm {
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub notes: Option<String>,
    /// Defaults to the submission time
    pub measurement_date: Option<DateTime<Utc>>,
}

/// Watering form, amount in milliliters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WateringForm {
    pub amount: Option<f64>,
    pub notes: Option<String>,
    /// Defaults to the submission time
    pub watering_date: Option<DateTime<Utc>>,
}

fn check_size(field: &'static str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(AppError::validation(
            field,
            "La mesure doit être un nombre positif",
        )),
        _ => Ok(()),
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

impl MeasurementForm {
    pub fn validate(&self) -> Result<()> {
        if self.height.is_none() && self.width.is_none() {
            return Err(AppError::validation(
                "height",
                "Indiquez au moins la hauteur ou la largeur",
            ));
        }
        check_size("height", self.height)?;
        check_size("width", self.width)
    }
}

impl WateringForm {
    pub fn validate(&self) -> Result<f64> {
        match self.amount {
            Some(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
            _ => Err(AppError::validation(
                "amount",
                "La quantité d'eau doit être supérieure à 0",
            )),
        }
    }
}

/// Service for measurement and watering logs
#[derive(Clone)]
pub struct LogsService {
    plants: Arc<dyn PlantStore>,
    logs: Arc<dyn LogStore>,
    advice: AdviceService,
}

impl LogsService {
    pub fn new(plants: Arc<dyn PlantStore>, logs: Arc<dyn LogStore>, advice: AdviceService) -> Self {
        Self {
            plants,
            logs,
            advice,
        }
    }

    async fn ensure_owner(&self, user_id: &str, plant_id: &str) -> Result<()> {
        self.plants.get_plant(user_id, plant_id).await.map(|_| ())
    }

    /// Record a measurement and return the updated history. Cached advice
    /// for the plant is dropped.
    pub async fn add_measurement(
        &self,
        user_id: &str,
        plant_id: &str,
        form: MeasurementForm,
    ) -> Result<Vec<Measurement>> {
        form.validate()?;
        self.ensure_owner(user_id, plant_id).await?;

        let measurement = self
            .logs
            .insert_measurement(CreateMeasurementRequest {
                plant_id: plant_id.to_string(),
                height: form.height,
                width: form.width,
                notes: clean_notes(form.notes),
                measurement_date: form.measurement_date.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!("Measurement {} added to plant: {}", measurement.id, plant_id);
        self.advice.invalidate(plant_id);

        self.logs.list_measurements(plant_id, None).await
    }

    /// Record a watering and return the updated history
    pub async fn add_watering(
        &self,
        user_id: &str,
        plant_id: &str,
        form: WateringForm,
    ) -> Result<Vec<WateringRecord>> {
        let amount = form.validate()?;
        self.ensure_owner(user_id, plant_id).await?;

        let record = self
            .logs
            .insert_watering(CreateWateringRequest {
                plant_id: plant_id.to_string(),
                amount,
                notes: clean_notes(form.notes),
                watering_date: form.watering_date.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!("Watering {} added to plant: {}", record.id, plant_id);

        self.logs.list_waterings(plant_id).await
    }

    /// Measurement history, most recent first
    pub async fn measurements(&self, user_id: &str, plant_id: &str) -> Result<Vec<Measurement>> {
        self.ensure_owner(user_id, plant_id).await?;
        self.logs.list_measurements(plant_id, None).await
    }

    /// The `limit` most recent measurements
    pub async fn recent_measurements(
        &self,
        user_id: &str,
        plant_id: &str,
        limit: i64,
    ) -> Result<Vec<Measurement>> {
        self.ensure_owner(user_id, plant_id).await?;
        self.logs.list_measurements(plant_id, Some(limit)).await
    }

    /// Watering history, most recent first
    pub async fn waterings(&self, user_id: &str, plant_id: &str) -> Result<Vec<WateringRecord>> {
        self.ensure_owner(user_id, plant_id).await?;
        self.logs.list_waterings(plant_id).await
    }
}
