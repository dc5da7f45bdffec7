//! Profile commands

use super::CurrentUser;
use crate::app::AppState;
use crate::database::Profile;
use crate::error::Result;
use crate::services::ProfileForm;
use axum::extract::State;
use axum::Json;

/// Profile of the current user; `null` until first saved
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Option<Profile>>> {
    Ok(Json(state.profile.get_profile(user.id()).await?))
}

pub async fn save_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profile.save_profile(user.id(), form).await?))
}
