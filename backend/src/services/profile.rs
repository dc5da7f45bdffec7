//! Profile service

use crate::database::{Profile, ProfileStore, UpsertProfileRequest};
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Profile form; blank strings are stored as absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar_url: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileForm {
    fn into_request(self) -> Result<UpsertProfileRequest> {
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::validation("latitude", "Latitude invalide"));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::validation("longitude", "Longitude invalide"));
            }
        }

        Ok(UpsertProfileRequest {
            full_name: clean(self.full_name),
            phone: clean(self.phone),
            address: clean(self.address),
            latitude: self.latitude,
            longitude: self.longitude,
            avatar_url: clean(self.avatar_url),
        })
    }
}

/// Split a free-text address into (city, country).
///
/// Comma-separated segments are trimmed and blanks dropped; the last one is
/// the country and the one before it the city. A single segment is taken
/// as a city without country.
pub fn parse_address(address: &str) -> (Option<String>, Option<String>) {
    let segments: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [] => (None, None),
        [city] => (Some(city.to_string()), None),
        [.., city, country] => (Some(city.to_string()), Some(country.to_string())),
    }
}

/// Service for user profiles
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.store.get_profile(user_id).await
    }

    /// Create or update the profile of `user_id`
    pub async fn save_profile(&self, user_id: &str, form: ProfileForm) -> Result<Profile> {
        let req = form.into_request()?;
        tracing::info!("Saving profile for user: {}", user_id);
        self.store.upsert_profile(user_id, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Repository};
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("12 Rue de Marseille, Sfax, Tunisie"),
            (Some("Sfax".to_string()), Some("Tunisie".to_string()))
        );
        assert_eq!(
            parse_address("Sousse , Tunisie"),
            (Some("Sousse".to_string()), Some("Tunisie".to_string()))
        );
        assert_eq!(parse_address("Bizerte"), (Some("Bizerte".to_string()), None));
        assert_eq!(
            parse_address("Nabeul, , Tunisie,"),
            (Some("Nabeul".to_string()), Some("Tunisie".to_string()))
        );
        assert_eq!(parse_address(" , "), (None, None));
    }

    #[tokio::test]
    async fn test_save_profile_upserts() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let service = ProfileService::new(Arc::new(Repository::new(pool)));

        let first = service
            .save_profile(
                "user-1",
                ProfileForm {
                    full_name: Some(" Yasmine ".to_string()),
                    phone: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.full_name.as_deref(), Some("Yasmine"));
        assert_eq!(first.phone, None);

        let second = service
            .save_profile(
                "user-1",
                ProfileForm {
                    full_name: Some("Yasmine".to_string()),
                    address: Some("Sfax, Tunisie".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.id, first.id);

        let invalid = service
            .save_profile(
                "user-1",
                ProfileForm {
                    latitude: Some(120.0),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(invalid, Err(AppError::Validation { field: "latitude", .. })));

        let stored = service.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(stored.address.as_deref(), Some("Sfax, Tunisie"));
    }
}
