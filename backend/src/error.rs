//! Error types for Nabtati
//!
//! All errors use thiserror for structured error handling.
//! These errors are rendered to the front-end as JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Plant not found: {0}")]
    PlantNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Advice error: {0}")]
    Advice(String),

    #[error("Weather error: {0}")]
    Weather(String),

    #[error("Missing or invalid user identity")]
    Unauthorized,

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::PlantNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Weather(_) | Self::Advice(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user. Remote and internal failures are not
    /// distinguished; configuration problems get their own wording.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::PlantNotFound(_) => "Plante introuvable".to_string(),
            Self::Unauthorized => "Authentification requise".to_string(),
            Self::Configuration(_) => {
                "Configuration manquante. Veuillez contacter l'administrateur.".to_string()
            }
            Self::Weather(_) => "Impossible de récupérer la météo".to_string(),
            _ => "Une erreur est survenue. Veuillez réessayer.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = match &self {
            Self::Validation { field, .. } => json!({ "error": self.user_message(), "field": field }),
            _ => json!({ "error": self.user_message() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
