//! Measurement and watering commands

use super::CurrentUser;
use crate::app::AppState;
use crate::database::{Measurement, WateringRecord};
use crate::error::Result;
use crate::services::{MeasurementForm, WateringForm};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only the most recent entries
    pub limit: Option<i64>,
}

/// Measurement history, most recent first
pub async fn list_measurements(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Measurement>>> {
    let history = match query.limit.filter(|l| *l > 0) {
        Some(limit) => state.logs.recent_measurements(user.id(), &id, limit).await?,
        None => state.logs.measurements(user.id(), &id).await?,
    };
    Ok(Json(history))
}

/// Record a measurement; responds with the refreshed history
pub async fn add_measurement(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(form): Json<MeasurementForm>,
) -> Result<(StatusCode, Json<Vec<Measurement>>)> {
    let history = state.logs.add_measurement(user.id(), &id, form).await?;
    Ok((StatusCode::CREATED, Json(history)))
}

pub async fn list_waterings(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<WateringRecord>>> {
    Ok(Json(state.logs.waterings(user.id(), &id).await?))
}

/// Record a watering; responds with the refreshed history
pub async fn add_watering(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(form): Json<WateringForm>,
) -> Result<(StatusCode, Json<Vec<WateringRecord>>)> {
    let history = state.logs.add_watering(user.id(), &id, form).await?;
    Ok((StatusCode::CREATED, Json(history)))
}
