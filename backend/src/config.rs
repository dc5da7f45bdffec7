//! Application configuration
//!
//! Central location for configuration constants, resource limits and
//! validation boundaries, plus the runtime `Settings` assembled by the CLI.

use std::path::PathBuf;
use std::time::Duration;

// ===== Plant Limits =====

/// Maximum number of photos accepted in one upload batch
pub const MAX_PHOTOS_PER_PLANT: usize = 5;

/// Maximum length of a plant name
pub const MAX_PLANT_NAME_LENGTH: usize = 120;

/// Upper bound of the stored growth percentage
pub const MAX_GROWTH_PERCENT: i64 = 100;

// ===== Advice =====

/// Number of recent measurements forwarded with an advice request
pub const ADVICE_RECENT_MEASUREMENTS: i64 = 5;

/// Text shown when the advice request failed
pub const ADVICE_FALLBACK_TEXT: &str = "Conseil non disponible pour le moment. Veuillez réessayer.";

/// Chat-completion model used by the advice proxy
pub const ADVICE_MODEL: &str = "gpt-4o-mini";

/// Token budget of one advice completion (2-3 sentences)
pub const ADVICE_MAX_TOKENS: u32 = 250;

/// Sampling temperature of the advice completion
pub const ADVICE_TEMPERATURE: f32 = 0.7;

/// Environment variable holding the language-model API key.
/// Read on every proxy request, never cached.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

// ===== Weather =====

/// A forecast day strictly above this temperature raises a heat alert
pub const HEAT_ALERT_THRESHOLD_C: f64 = 35.0;

/// Number of distinct days kept from the forecast
pub const FORECAST_DAYS: usize = 4;

/// Location used when the user has no city/country on file
pub const DEFAULT_CITY: &str = "Tunis";
pub const DEFAULT_COUNTRY: &str = "Tunisie";

// ===== Network =====

/// Timeout applied to every outbound HTTP call
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Path of the advice proxy function, relative to the server root
pub const ADVICE_PROXY_PATH: &str = "/functions/v1/generate-plant-advice";

/// Path prefix under which stored photos are publicly served
pub const STORAGE_ROUTE_PREFIX: &str = "/storage";

/// Header carrying the authenticated user id, set by the auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Request body limit for photo uploads (5 photos of up to 8 MiB)
pub const UPLOAD_BODY_LIMIT: usize = 5 * 8 * 1024 * 1024;

/// Runtime settings for the server and its outbound clients
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Base URL used to build public photo URLs
    pub public_base_url: String,
    /// Where the advice panel sends its requests
    pub advice_url: String,
    pub openai_base_url: String,
    pub openweather_base_url: String,
    pub openweather_api_key: Option<String>,
}

impl Settings {
    /// Settings with every optional value derived from host, port and data dir
    pub fn new(host: impl Into<String>, port: u16, data_dir: impl Into<PathBuf>) -> Self {
        let host = host.into();
        let root = format!("http://{}:{}", host, port);

        Self {
            public_base_url: format!("{}{}", root, STORAGE_ROUTE_PREFIX),
            advice_url: format!("{}{}", root, ADVICE_PROXY_PATH),
            host,
            port,
            data_dir: data_dir.into(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            openweather_api_key: None,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("nabtati.db")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
