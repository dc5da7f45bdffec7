//! Plant commands
//!
//! Creation takes a multipart body: one `plant` field holding the JSON form
//! and up to five `photo` file fields.

use super::CurrentUser;
use crate::app::AppState;
use crate::database::{PlantDetails, PlantPhoto};
use crate::error::{AppError, Result};
use crate::services::{NewPlantForm, PhotoBatch, PhotoUpload, PlantCard, PlantCreated};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

/// Parsed multipart body of a plant or photo upload
#[derive(Debug, Default)]
struct UploadBody {
    form: Option<NewPlantForm>,
    photos: Vec<PhotoUpload>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadBody> {
    let mut body = UploadBody::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("body", e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("plant") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation("plant", e.body_text()))?;
                let form = serde_json::from_str(&text)
                    .map_err(|e| AppError::validation("plant", e.to_string()))?;
                body.form = Some(form);
            }
            Some("photo") | Some("photos") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation("photos", e.body_text()))?;
                if data.is_empty() {
                    continue;
                }
                body.photos.push(PhotoUpload {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {
                tracing::debug!("Ignoring multipart field: {:?}", name);
            }
        }
    }

    Ok(body)
}

/// Create a plant with its photos
pub async fn create_plant(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PlantCreated>)> {
    let body = read_upload(multipart).await?;
    let form = body.form.unwrap_or_default();

    let created = state
        .plants
        .create_plant(user.id(), form, body.photos)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Plants of the current user as dashboard cards
pub async fn list_plants(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<PlantCard>>> {
    Ok(Json(state.plants.list_plants(user.id()).await?))
}

pub async fn get_plant(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PlantDetails>> {
    Ok(Json(state.plants.get_plant(user.id(), &id).await?))
}

pub async fn list_photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PlantPhoto>>> {
    Ok(Json(state.photos.list_photos(user.id(), &id).await?))
}

/// Add photos to an existing plant
pub async fn upload_photos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoBatch>)> {
    let body = read_upload(multipart).await?;
    let batch = state
        .photos
        .upload_photos(user.id(), &id, body.photos)
        .await?;

    Ok((StatusCode::CREATED, Json(batch)))
}
