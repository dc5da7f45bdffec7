//! Taxonomy service
//!
//! Category and variety lookup for the plant form. Every call goes to the
//! store; nothing is cached.

use crate::database::{PlantCategory, PlantVariety, TaxonomyStore};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Service for browsing the category → variety taxonomy
#[derive(Clone)]
pub struct TaxonomyService {
    store: Arc<dyn TaxonomyStore>,
}

impl TaxonomyService {
    pub fn new(store: Arc<dyn TaxonomyStore>) -> Self {
        Self { store }
    }

    /// All categories, sorted by name
    pub async fn list_categories(&self) -> Result<Vec<PlantCategory>> {
        self.store.list_categories().await
    }

    /// Varieties of one category, sorted by name
    pub async fn list_varieties(&self, category_id: &str) -> Result<Vec<PlantVariety>> {
        tracing::debug!("Listing varieties of category: {}", category_id);
        self.store.list_varieties(category_id).await
    }

    pub async fn get_variety(&self, variety_id: &str) -> Result<Option<PlantVariety>> {
        self.store.get_variety(variety_id).await
    }
}

/// Category/variety choice made in the plant form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarietySelection {
    pub category_id: Option<String>,
    pub variety_id: Option<String>,
    pub variety_name: Option<String>,
}

impl VarietySelection {
    /// Pick a category. Changing category drops the chosen variety.
    pub fn choose_category(&mut self, category_id: impl Into<String>) {
        let category_id = category_id.into();
        if self.category_id.as_deref() != Some(category_id.as_str()) {
            self.variety_id = None;
            self.variety_name = None;
        }
        self.category_id = Some(category_id);
    }

    pub fn choose_variety(&mut self, variety: &PlantVariety) {
        self.category_id = Some(variety.category_id.clone());
        self.variety_id = Some(variety.id.clone());
        self.variety_name = Some(variety.name.clone());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
