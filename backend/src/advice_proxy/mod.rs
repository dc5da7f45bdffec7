//! Plant advice proxy
//!
//! Stateless HTTP function: receives a plant description, builds a French
//! prompt and forwards it to a hosted chat-completion API. The API key never
//! leaves the server.

pub mod openai;
pub mod prompt;
pub mod secrets;

pub use openai::{CompletionBackend, CompletionError, OpenAiClient};
pub use secrets::{EnvSecrets, SecretSource};

use crate::config::{ADVICE_PROXY_PATH, ENV_OPENAI_API_KEY};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

const MISSING_KEY_MESSAGE: &str = "Configuration manquante. Veuillez contacter l'administrateur.";
const GENERATION_FAILED_MESSAGE: &str =
    "Impossible de générer le conseil pour le moment. Veuillez réessayer.";

/// Measurement as forwarded by the front-end. Extra columns are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceMeasurement {
    pub height: Option<f64>,
    pub width: Option<f64>,
    #[serde(alias = "measurement_date")]
    pub measurement_date: Option<DateTime<Utc>>,
}

/// Body of an advice request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRequest {
    #[serde(default)]
    pub plant_name: String,
    pub variety: Option<String>,
    /// ISO date, a timestamp is accepted and truncated to its date
    pub planting_date: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<AdviceMeasurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl AdviceRequest {
    pub fn planting_date(&self) -> Option<NaiveDate> {
        let raw = self.planting_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub advice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub error: String,
}

/// Proxy failures, all reported as HTTP 500 with a French message
#[derive(Debug)]
pub enum ProxyError {
    MissingKey,
    Generation,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::MissingKey => MISSING_KEY_MESSAGE,
            Self::Generation => GENERATION_FAILED_MESSAGE,
        };

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ProxyErrorBody {
                error: error.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct ProxyState {
    pub secrets: Arc<dyn SecretSource>,
    pub backend: Arc<dyn CompletionBackend>,
}

/// Permissive CORS so the function can be called from any front-end origin
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            ADVICE_PROXY_PATH,
            post(generate_advice).options(|| async { StatusCode::OK }),
        )
        .layer(cors())
        .with_state(state)
}

async fn generate_advice(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Json<AdviceResponse>, ProxyError> {
    let Some(api_key) = state.secrets.get(ENV_OPENAI_API_KEY) else {
        tracing::error!("{} is not set", ENV_OPENAI_API_KEY);
        return Err(ProxyError::MissingKey);
    };

    let req: AdviceRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Invalid advice request: {}", e);
        ProxyError::Generation
    })?;

    tracing::info!("Generating advice for plant: {}", req.plant_name);

    let prompt = prompt::build_prompt(&req, Utc::now());
    let advice = state
        .backend
        .complete(&api_key, prompt::SYSTEM_PROMPT, &prompt)
        .await
        .map_err(|e| {
            tracing::error!("Error generating plant advice: {}", e);
            ProxyError::Generation
        })?;

    tracing::info!("Advice generated for plant: {}", req.plant_name);

    Ok(Json(AdviceResponse { advice }))
}
