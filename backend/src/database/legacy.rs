//! Adapters for legacy data shapes
//!
//! Earlier exports used a flat variety list tagged with a free-text category,
//! numeric plant ids, and a `photo_url` stored directly on the plant. These
//! helpers translate them into the canonical category → variety taxonomy and
//! `plant_photos` rows.

use super::models::{CreatePhotoRequest, CreatePlantRequest, PlantDetails, PlantStatus};
use super::store::{PlantStore, TaxonomyStore};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Category assigned to flat varieties without a category tag
pub const UNCATEGORIZED: &str = "Autres";

/// Entry of the flat variety list
#[derive(Debug, Clone, Deserialize)]
pub struct FlatVariety {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub categories_created: usize,
    pub varieties_created: usize,
    pub skipped: usize,
}

/// Import a flat variety list, creating missing categories by tag.
/// Varieties already present in their category are skipped.
pub async fn import_flat_varieties(
    store: &dyn TaxonomyStore,
    items: &[FlatVariety],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut category_ids: HashMap<String, String> = HashMap::new();
    let mut known: HashMap<String, HashSet<String>> = HashMap::new();

    for item in items {
        let name = item.name.trim();
        if name.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let tag = item
            .category
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNCATEGORIZED);

        let category_id = match category_ids.get(&tag.to_lowercase()) {
            Some(id) => id.clone(),
            None => {
                let category = match store.find_category_by_name(tag).await? {
                    Some(category) => category,
                    None => {
                        summary.categories_created += 1;
                        store.insert_category(tag, None).await?
                    }
                };
                category_ids.insert(tag.to_lowercase(), category.id.clone());
                category.id
            }
        };

        if !known.contains_key(&category_id) {
            let existing = store
                .list_varieties(&category_id)
                .await?
                .into_iter()
                .map(|v| v.name.to_lowercase())
                .collect();
            known.insert(category_id.clone(), existing);
        }

        let names = known.entry(category_id.clone()).or_default();
        if !names.insert(name.to_lowercase()) {
            summary.skipped += 1;
            continue;
        }

        store
            .insert_variety(&category_id, name, item.description.as_deref())
            .await?;
        summary.varieties_created += 1;
    }

    tracing::info!(
        "Imported flat varieties: {} categories, {} varieties, {} skipped",
        summary.categories_created,
        summary.varieties_created,
        summary.skipped
    );

    Ok(summary)
}

/// Plant as exported by the legacy schema
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPlant {
    /// Numeric or string id
    pub id: serde_json::Value,
    pub name: String,
    pub variety: Option<String>,
    #[serde(alias = "plantingDate")]
    pub planting_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "lastPhoto")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyImport {
    pub legacy_id: Option<String>,
    pub plant: PlantDetails,
}

/// Normalize a legacy id (number or string) to its string form
pub fn normalize_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Placeholder images used by the legacy front-end are not real photos
fn is_placeholder(url: &str) -> bool {
    url.trim().is_empty() || url.ends_with("placeholder.svg")
}

/// Re-create a legacy plant for `user_id`, moving its `photo_url` into a
/// primary photo row.
pub async fn import_legacy_plant(
    store: &dyn PlantStore,
    user_id: &str,
    legacy: LegacyPlant,
) -> Result<LegacyImport> {
    let legacy_id = normalize_id(&legacy.id);
    let status = legacy
        .status
        .as_deref()
        .and_then(|s| s.parse::<PlantStatus>().ok())
        .unwrap_or_default();

    let plant = store
        .insert_plant(
            user_id,
            CreatePlantRequest {
                name: legacy.name,
                variety_id: None,
                custom_variety: legacy.variety,
                planting_date: legacy.planting_date,
                location: legacy.location,
                purchase_price: None,
                notes: legacy.notes,
                status,
            },
        )
        .await?;

    if let Some(url) = legacy.photo_url.filter(|u| !is_placeholder(u)) {
        store
            .insert_photo(CreatePhotoRequest {
                plant_id: plant.id.clone(),
                photo_url: url,
                storage_key: None,
                description: None,
                is_primary: true,
            })
            .await?;
    }

    tracing::debug!("Imported legacy plant {:?} as {}", legacy_id, plant.id);

    let plant = store.get_plant(user_id, &plant.id).await?;
    Ok(LegacyImport { legacy_id, plant })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, Repository};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        Repository::new(pool)
    }

    fn flat(name: &str, category: Option<&str>) -> FlatVariety {
        FlatVariety {
            name: name.to_string(),
            category: category.map(String::from),
            description: None,
        }
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id(&json!(12)), Some("12".to_string()));
        assert_eq!(normalize_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(normalize_id(&json!("")), None);
        assert_eq!(normalize_id(&json!(null)), None);
    }

    #[tokio::test]
    async fn test_import_flat_varieties() {
        let repo = create_test_repo().await;

        let items = vec![
            flat("Courgette", Some("Légumes")),
            flat("Tomate", Some("légumes")),
            flat("Aloe vera", Some("Succulentes")),
            flat("Mystère", None),
            flat("  ", Some("Fleurs")),
        ];

        let summary = import_flat_varieties(&repo, &items).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                categories_created: 2,
                varieties_created: 3,
                skipped: 2,
            }
        );

        let legumes = repo.find_category_by_name("Légumes").await.unwrap().unwrap();
        let names: Vec<String> = repo
            .list_varieties(&legumes.id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert!(names.contains(&"Courgette".to_string()));

        let other = repo.find_category_by_name(UNCATEGORIZED).await.unwrap();
        assert!(other.is_some());

        // Second run creates nothing
        let again = import_flat_varieties(&repo, &items).await.unwrap();
        assert_eq!(again.varieties_created, 0);
        assert_eq!(again.categories_created, 0);
    }

    #[tokio::test]
    async fn test_import_legacy_plant_moves_photo() {
        let repo = create_test_repo().await;

        let legacy: LegacyPlant = serde_json::from_value(json!({
            "id": 1,
            "name": "Tomates Cerises",
            "variety": "Cherry Roma",
            "plantingDate": "2024-03-15",
            "location": "Jardin Principal",
            "status": "needs-water",
            "lastPhoto": "https://cdn.example.com/tomates.jpg"
        }))
        .unwrap();

        let imported = import_legacy_plant(&repo, "user-1", legacy).await.unwrap();
        assert_eq!(imported.legacy_id.as_deref(), Some("1"));
        assert_eq!(imported.plant.plant.status, PlantStatus::NeedsWater);
        assert_eq!(imported.plant.photos.len(), 1);
        assert!(imported.plant.photos[0].is_primary);
    }

    #[tokio::test]
    async fn test_import_legacy_plant_skips_placeholder() {
        let repo = create_test_repo().await;

        let legacy: LegacyPlant = serde_json::from_value(json!({
            "id": "2",
            "name": "Basilic",
            "lastPhoto": "/placeholder.svg"
        }))
        .unwrap();

        let imported = import_legacy_plant(&repo, "user-1", legacy).await.unwrap();
        assert!(imported.plant.photos.is_empty());
        assert_eq!(imported.plant.plant.status, PlantStatus::Healthy);
    }
}
