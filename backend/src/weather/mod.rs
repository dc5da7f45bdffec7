//! Weather panel
//!
//! Resolves a city/country to coordinates, then fetches current conditions
//! and the forecast concurrently and shapes them into a report: one entry
//! per local calendar day for the next four days, with heat alerts.

pub mod openweather;

pub use openweather::{OpenWeatherClient, WeatherApi};

use crate::config::{DEFAULT_CITY, DEFAULT_COUNTRY, FORECAST_DAYS, HEAT_ALERT_THRESHOLD_C};
use crate::database::Profile;
use crate::error::{AppError, Result};
use crate::services::parse_address;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use openweather::{CurrentConditions, Forecast, WeatherCondition};
use serde::Serialize;
use std::sync::Arc;

/// Simplified sky condition shown in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
}

impl Condition {
    /// Map an OpenWeatherMap condition code
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=699 => Self::Rainy,
            700..=799 => Self::Cloudy,
            800 => Self::Sunny,
            801 | 802 => Self::PartlyCloudy,
            803..=804 => Self::Cloudy,
            _ => Self::Sunny,
        }
    }

    fn from_conditions(conditions: &[WeatherCondition]) -> Self {
        conditions
            .first()
            .map(|c| Self::from_code(c.id))
            .unwrap_or(Self::Sunny)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sunny => "Ensoleillé",
            Self::PartlyCloudy => "Partiellement nuageux",
            Self::Cloudy => "Nuageux",
            Self::Rainy => "Pluvieux",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    /// Rounded to the nearest degree
    pub temperature: i64,
    pub humidity: u8,
    pub condition: Condition,
    pub condition_label: &'static str,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// "Aujourd'hui", "Demain", "Après-demain" or the weekday
    pub day: String,
    /// Rounded up, so any alerting day shows at least 36
    pub temperature: i64,
    pub humidity: u8,
    pub condition: Condition,
    pub condition_label: &'static str,
    pub alert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    /// "City, Country" as requested
    pub location: String,
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
    pub alerts: Vec<String>,
}

/// Raw temperatures strictly above the threshold raise an alert
pub fn is_heat_alert(temperature: f64) -> bool {
    temperature > HEAT_ALERT_THRESHOLD_C
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Lundi",
        Weekday::Tue => "Mardi",
        Weekday::Wed => "Mercredi",
        Weekday::Thu => "Jeudi",
        Weekday::Fri => "Vendredi",
        Weekday::Sat => "Samedi",
        Weekday::Sun => "Dimanche",
    }
}

/// Display label of a forecast day relative to `today`
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Aujourd'hui".to_string(),
        1 => "Demain".to_string(),
        2 => "Après-demain".to_string(),
        _ => weekday_name(date.weekday()).to_string(),
    }
}

fn local_date(timestamp: i64, offset_seconds: i32) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + offset_seconds as i64, 0).map(|dt| dt.date_naive())
}

/// Shape provider data into a report. Forecast steps are grouped by local
/// calendar day and the first step of each of the first four days is kept.
pub fn build_report(
    city: &str,
    country: &str,
    current: CurrentConditions,
    forecast: Forecast,
    now: DateTime<Utc>,
) -> WeatherReport {
    let offset = forecast.city.timezone;
    let today = local_date(now.timestamp(), offset).unwrap_or_else(|| now.date_naive());

    let mut entries = forecast.list;
    entries.sort_by_key(|e| e.dt);

    let mut days: Vec<ForecastDay> = Vec::with_capacity(FORECAST_DAYS);
    let mut alerts = Vec::new();

    for entry in entries {
        if days.len() == FORECAST_DAYS {
            break;
        }
        let Some(date) = local_date(entry.dt, offset) else {
            continue;
        };
        if days.last().is_some_and(|d| d.date == date) {
            continue;
        }

        let condition = Condition::from_conditions(&entry.weather);
        let temperature = entry.main.temp.ceil() as i64;
        let alert = is_heat_alert(entry.main.temp);
        let day = day_label(date, today);

        if alert {
            alerts.push(format!(
                "Forte chaleur prévue {} à {} (+{}°C)",
                day.to_lowercase(),
                city,
                temperature
            ));
        }

        days.push(ForecastDay {
            date,
            day,
            temperature,
            humidity: entry.main.humidity,
            condition,
            condition_label: condition.label(),
            alert,
        });
    }

    let condition = Condition::from_conditions(&current.weather);

    WeatherReport {
        location: format!("{}, {}", city, country),
        current: CurrentWeather {
            temperature: current.main.temp.round() as i64,
            humidity: current.main.humidity,
            condition,
            condition_label: condition.label(),
            description: current
                .weather
                .first()
                .map(|w| w.description.clone())
                .filter(|d| !d.is_empty()),
        },
        forecast: days,
        alerts,
    }
}

/// Service for the weather panel
#[derive(Clone)]
pub struct WeatherService {
    api: Arc<dyn WeatherApi>,
}

impl WeatherService {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    /// Report for a city/country pair. Unless both are given the default
    /// location is used. Any failure fails the whole report.
    pub async fn report(&self, city: Option<&str>, country: Option<&str>) -> Result<WeatherReport> {
        let (city, country) = match (
            city.map(str::trim).filter(|c| !c.is_empty()),
            country.map(str::trim).filter(|c| !c.is_empty()),
        ) {
            (Some(city), Some(country)) => (city, country),
            _ => (DEFAULT_CITY, DEFAULT_COUNTRY),
        };

        tracing::info!("Fetching weather for: {}, {}", city, country);

        self.fetch(city, country).await.map_err(|e| match e {
            AppError::Configuration(_) | AppError::Weather(_) => e,
            other => AppError::Weather(other.to_string()),
        })
    }

    /// Report for the location parsed from the profile address
    pub async fn report_for_profile(&self, profile: Option<&Profile>) -> Result<WeatherReport> {
        let (city, country) = profile
            .and_then(|p| p.address.as_deref())
            .map(parse_address)
            .unwrap_or_default();

        self.report(city.as_deref(), country.as_deref()).await
    }

    async fn fetch(&self, city: &str, country: &str) -> Result<WeatherReport> {
        let location = match self.api.geocode(&format!("{},{}", city, country)).await? {
            Some(location) => location,
            None => self
                .api
                .geocode(city)
                .await?
                .ok_or_else(|| AppError::Weather(format!("Location not found: {}", city)))?,
        };

        tracing::debug!(
            "Resolved {} to ({}, {})",
            city,
            location.lat,
            location.lon
        );

        let (current, forecast) = tokio::try_join!(
            self.api.current(location.lat, location.lon),
            self.api.forecast(location.lat, location.lon),
        )?;

        Ok(build_report(city, country, current, forecast, Utc::now()))
    }
}
