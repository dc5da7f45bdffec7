//! Advice panel service
//!
//! Fetches care advice for a plant from the advice proxy and memoizes the
//! outcome per plant id. Concurrent callers share one in-flight request; a
//! failed request stays failed until the entry is invalidated.

use crate::advice_proxy::{AdviceMeasurement, AdviceRequest, AdviceResponse, ProxyErrorBody};
use crate::config::{ADVICE_FALLBACK_TEXT, ADVICE_RECENT_MEASUREMENTS, HTTP_TIMEOUT};
use crate::database::{LogStore, Measurement, PlantDetails, PlantStore};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

/// Client of the advice proxy
#[async_trait]
pub trait AdviceClient: Send + Sync {
    async fn request_advice(&self, req: &AdviceRequest) -> Result<String>;
}

/// Calls the advice proxy over HTTP
#[derive(Debug, Clone)]
pub struct HttpAdviceClient {
    http: Client,
    url: String,
}

impl HttpAdviceClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("nabtati/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AdviceClient for HttpAdviceClient {
    async fn request_advice(&self, req: &AdviceRequest) -> Result<String> {
        let response = self.http.post(&self.url).json(req).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ProxyErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(AppError::Advice(message));
        }

        Ok(response.json::<AdviceResponse>().await?.advice)
    }
}

/// Panel state of one plant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdviceState {
    Idle,
    Loading,
    Ready { advice: String },
    Failed { advice: String },
}

impl AdviceState {
    /// Text to display in the panel, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ready { advice } | Self::Failed { advice } => Some(advice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Ready(String),
    Failed,
}

impl From<&Outcome> for AdviceState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Ready(advice) => Self::Ready {
                advice: advice.clone(),
            },
            Outcome::Failed => Self::Failed {
                advice: ADVICE_FALLBACK_TEXT.to_string(),
            },
        }
    }
}

type Entry = Arc<OnceCell<Outcome>>;

/// Build the proxy request for a plant from its details and recent
/// measurements (most recent first)
pub fn advice_request(
    details: &PlantDetails,
    measurements: &[Measurement],
    temperature: Option<f64>,
) -> AdviceRequest {
    AdviceRequest {
        plant_name: details.plant.name.clone(),
        variety: details.variety_label(),
        planting_date: details.plant.planting_date.map(|d| d.to_string()),
        location: details.plant.location.clone(),
        status: Some(details.plant.status.as_str().to_string()),
        measurements: measurements
            .iter()
            .map(|m| AdviceMeasurement {
                height: m.height,
                width: m.width,
                measurement_date: Some(m.measurement_date),
            })
            .collect(),
        temperature,
    }
}

/// Service for the advice panel
#[derive(Clone)]
pub struct AdviceService {
    plants: Arc<dyn PlantStore>,
    logs: Arc<dyn LogStore>,
    client: Arc<dyn AdviceClient>,
    cache: Arc<Mutex<HashMap<String, Entry>>>,
}

impl AdviceService {
    pub fn new(
        plants: Arc<dyn PlantStore>,
        logs: Arc<dyn LogStore>,
        client: Arc<dyn AdviceClient>,
    ) -> Self {
        Self {
            plants,
            logs,
            client,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Entries stay consistent even if a holder panicked
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entry(&self, plant_id: &str) -> Entry {
        self.lock()
            .entry(plant_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Current panel state without triggering a request
    pub fn state(&self, plant_id: &str) -> AdviceState {
        match self.lock().get(plant_id) {
            None => AdviceState::Idle,
            Some(cell) => match cell.get() {
                None => AdviceState::Loading,
                Some(outcome) => outcome.into(),
            },
        }
    }

    /// Advice for a plant of `user_id`, requested at most once per cached
    /// entry. The temperature only matters for the first request.
    pub async fn advice_for(
        &self,
        user_id: &str,
        plant_id: &str,
        temperature: Option<f64>,
    ) -> Result<AdviceState> {
        let details = self.plants.get_plant(user_id, plant_id).await?;

        let cell = self.entry(plant_id);
        let outcome = cell
            .get_or_init(|| self.fetch(details, temperature))
            .await;

        Ok(outcome.into())
    }

    async fn fetch(&self, details: PlantDetails, temperature: Option<f64>) -> Outcome {
        let plant_id = details.plant.id.clone();
        tracing::info!("Requesting advice for plant: {}", plant_id);

        let result = async {
            let measurements = self
                .logs
                .list_measurements(&plant_id, Some(ADVICE_RECENT_MEASUREMENTS))
                .await?;
            let req = advice_request(&details, &measurements, temperature);
            self.client.request_advice(&req).await
        }
        .await;

        match result {
            Ok(advice) => Outcome::Ready(advice),
            Err(e) => {
                tracing::error!("Error generating advice for plant {}: {}", plant_id, e);
                Outcome::Failed
            }
        }
    }

    /// Forget the cached advice of a plant; the next call requests again
    pub fn invalidate(&self, plant_id: &str) {
        if self.lock().remove(plant_id).is_some() {
            tracing::debug!("Advice invalidated for plant: {}", plant_id);
        }
    }
}
