//! Category and variety commands

use super::CurrentUser;
use crate::app::AppState;
use crate::database::{PlantCategory, PlantVariety};
use crate::error::Result;
use axum::extract::{Path, State};
use axum::Json;

pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<PlantCategory>>> {
    Ok(Json(state.taxonomy.list_categories().await?))
}

/// Varieties of one category, sorted by name
pub async fn list_varieties(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<PlantVariety>>> {
    Ok(Json(state.taxonomy.list_varieties(&category_id).await?))
}
