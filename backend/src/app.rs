//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available to the HTTP
//! handlers through `AppState`.

use crate::advice_proxy::{self, EnvSecrets, OpenAiClient, ProxyState};
use crate::commands;
use crate::config::Settings;
use crate::database::{create_pool, Repository};
use crate::error::{AppError, Result};
use crate::services::{
    AdviceClient, AdviceService, HttpAdviceClient, LogsService, PhotosService, PlantsService,
    ProfileService, TaxonomyService,
};
use crate::storage::{BlobStore, ObjectStorage};
use crate::weather::{OpenWeatherClient, WeatherApi, WeatherService};
use axum::Router;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub plants: PlantsService,
    pub photos: PhotosService,
    pub logs: LogsService,
    pub advice: AdviceService,
    pub taxonomy: TaxonomyService,
    pub profile: ProfileService,
    pub weather: WeatherService,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Wire the services over one repository and the given outbound clients
    pub fn new(
        repo: Repository,
        storage: Arc<dyn ObjectStorage>,
        advice_client: Arc<dyn AdviceClient>,
        weather_api: Arc<dyn WeatherApi>,
    ) -> Self {
        let repo = Arc::new(repo);

        let photos = PhotosService::new(repo.clone(), storage.clone());
        let advice = AdviceService::new(repo.clone(), repo.clone(), advice_client);
        let logs = LogsService::new(repo.clone(), repo.clone(), advice.clone());
        let plants = PlantsService::new(repo.clone(), repo.clone(), repo.clone(), photos.clone());

        Self {
            plants,
            photos,
            logs,
            advice,
            taxonomy: TaxonomyService::new(repo.clone()),
            profile: ProfileService::new(repo),
            weather: WeatherService::new(weather_api),
            storage,
        }
    }

    /// Open the database and storage under the data directory and build
    /// the outbound clients from `settings`
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("Data directory: {:?}", settings.data_dir);

        std::fs::create_dir_all(&settings.data_dir)?;

        let pool = create_pool(&settings.database_path()).await?;

        let blob_store = BlobStore::new(settings.storage_dir(), settings.public_base_url.clone());
        blob_store.initialize().await?;

        let advice_client = HttpAdviceClient::new(settings.advice_url.clone())?;
        let weather_api = OpenWeatherClient::new(
            settings.openweather_base_url.clone(),
            settings.openweather_api_key.clone(),
        )?;

        if settings.openweather_api_key.is_none() {
            tracing::warn!("OPENWEATHER_API_KEY is not set; the weather panel will report an error");
        }

        let state = Self::new(
            Repository::new(pool),
            Arc::new(blob_store),
            Arc::new(advice_client),
            Arc::new(weather_api),
        );

        tracing::info!("Application initialized successfully");

        Ok(state)
    }
}

/// Advice proxy state reading the API key from the environment
pub fn proxy_state(settings: &Settings) -> Result<ProxyState> {
    let backend = OpenAiClient::new(settings.openai_base_url.clone())
        .map_err(|e| AppError::Configuration(format!("Failed to build completion client: {}", e)))?;

    Ok(ProxyState {
        secrets: Arc::new(EnvSecrets),
        backend: Arc::new(backend),
    })
}

/// Full server: the JSON API, public storage and the advice proxy
pub fn build_router(state: AppState, proxy: ProxyState) -> Router {
    commands::router(state).merge(advice_proxy::router(proxy))
}
