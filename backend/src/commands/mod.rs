//! HTTP commands exposed to the front-end
//!
//! This module organizes handlers into logical submodules:
//! - `plants`: plant creation, cards, details and photos
//! - `logs`: measurement and watering history
//! - `advice`: advice panel state
//! - `taxonomy`: categories and varieties
//! - `profile`: user profile
//! - `weather`: weather panel
//! - `storage`: public photo URLs
//!
//! Every `/api` handler takes the `AppState` and the `CurrentUser` and
//! returns `Result<T, AppError>`.

pub mod advice;
pub mod logs;
pub mod plants;
pub mod profile;
pub mod storage;
pub mod taxonomy;
pub mod weather;

use crate::app::AppState;
use crate::config::{STORAGE_ROUTE_PREFIX, UPLOAD_BODY_LIMIT, USER_ID_HEADER};
use crate::error::AppError;
use axum::extract::{DefaultBodyLimit, FromRequestParts};
use axum::http::request::Parts;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Authenticated user id, placed in the `x-user-id` header by the auth
/// gateway in front of the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CurrentUser(v.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// Application information
#[derive(Serialize)]
pub struct AppInfo {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe
pub async fn health() -> Json<AppInfo> {
    Json(AppInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes of the JSON API and the public storage route
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/plants",
            get(plants::list_plants).post(plants::create_plant),
        )
        .route("/plants/{id}", get(plants::get_plant))
        .route(
            "/plants/{id}/photos",
            get(plants::list_photos).post(plants::upload_photos),
        )
        .route(
            "/plants/{id}/measurements",
            get(logs::list_measurements).post(logs::add_measurement),
        )
        .route(
            "/plants/{id}/waterings",
            get(logs::list_waterings).post(logs::add_watering),
        )
        .route("/plants/{id}/advice", get(advice::get_advice))
        .route("/taxonomy/categories", get(taxonomy::list_categories))
        .route(
            "/taxonomy/categories/{id}/varieties",
            get(taxonomy::list_varieties),
        )
        .route(
            "/profile",
            get(profile::get_profile).put(profile::save_profile),
        )
        .route("/weather", get(weather::get_weather))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .route(
            &format!("{}/{{*key}}", STORAGE_ROUTE_PREFIX),
            get(storage::serve_object),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
