//! Advice panel command

use super::CurrentUser;
use crate::app::AppState;
use crate::error::Result;
use crate::services::AdviceState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AdviceQuery {
    /// Current temperature shown in the weather panel, if known
    pub temperature: Option<f64>,
}

/// Advice for a plant, requested on first access and cached afterwards
pub async fn get_advice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<AdviceQuery>,
) -> Result<Json<AdviceState>> {
    let advice = state
        .advice
        .advice_for(user.id(), &id, query.temperature)
        .await?;
    Ok(Json(advice))
}
