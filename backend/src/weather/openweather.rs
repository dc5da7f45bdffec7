//! OpenWeatherMap client
//!
//! Geocoding (`geo/1.0/direct`), current conditions (`data/2.5/weather`)
//! and the 5-day / 3-hour forecast (`data/2.5/forecast`), all in metric
//! units with French descriptions.

use crate::config::HTTP_TIMEOUT;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Resolved coordinates of a place
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherCondition {
    /// OpenWeatherMap condition code (2xx thunderstorm ... 80x clouds)
    pub id: u16,
    #[serde(default)]
    pub description: String,
}

/// Current conditions at a coordinate
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
}

/// One 3-hour forecast step
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp, UTC
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastCity {
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

/// Third-party weather provider
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Best match for a place name, if any
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>>;

    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions>;

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast>;
}

/// HTTP client for the OpenWeatherMap API
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("nabtati/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("OPENWEATHER_API_KEY is not set".to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Weather(format!("{} returned {}: {}", path, status, body)));
        }

        Ok(response.json::<T>().await?)
    }

    fn coordinates(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", "metric".to_string()),
            ("lang", "fr".to_string()),
        ]
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        let matches: Vec<GeoLocation> = self
            .get(
                "geo/1.0/direct",
                &[("q", query.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        Ok(matches.into_iter().next())
    }

    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        self.get("data/2.5/weather", &Self::coordinates(lat, lon)).await
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast> {
        self.get("data/2.5/forecast", &Self::coordinates(lat, lon)).await
    }
}
