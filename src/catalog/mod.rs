//! Restaurant Catalog
//!
//! The restaurant list is a static JSON document shipped with the server.
//! It is loaded once at startup and shared read-only by every handler.
//!
//! ## Contents
//!
//! - [`types`]: restaurant, deal, menu and review records
//! - [`menu`]: keyword-based menu categorization
//! - [`tags`]: the popular-tag rule
//! - [`format`]: summary, distance, deal validity and dining-time text

pub mod format;
pub mod menu;
pub mod tags;
pub mod types;

pub use menu::{categorize_items, process_restaurant_menus, MenuCategory};
pub use tags::{is_popular, popular_tags, PopularTag, YelpRecord};
pub use types::{Deal, ImageRef, Menu, MenuItem, PriceRange, Restaurant, Review};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Restaurant list compiled into the binary
const BUNDLED_CATALOG: &str = include_str!("../../data/restaurants.json");

/// Maximum number of tags shown on a group card
const GROUP_TAG_LIMIT: usize = 5;

/// In-memory restaurant catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    restaurants: Vec<Restaurant>,
}

impl Catalog {
    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        Self { restaurants }
    }

    /// Load a catalog from a JSON array on disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_json(&content).map_err(|e| match e {
            CatalogError::Parse { error, .. } => CatalogError::Parse {
                path: Some(path.to_path_buf()),
                error,
            },
            other => other,
        })
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let restaurants: Vec<Restaurant> =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse {
                path: None,
                error: e.to_string(),
            })?;
        Ok(Self::new(restaurants))
    }

    /// The restaurant list shipped with the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Load from `path` when it exists, otherwise fall back to the bundled list
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) if p.exists() => {
                let catalog = Self::load(p)?;
                tracing::info!(path = ?p, restaurants = catalog.len(), "Loaded restaurant catalog");
                Ok(catalog)
            }
            Some(p) => {
                tracing::warn!(path = ?p, "Catalog file not found, using bundled restaurants");
                Self::bundled()
            }
            None => Self::bundled(),
        }
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&Restaurant> {
        let name = name.to_lowercase();
        self.restaurants
            .iter()
            .find(|r| r.name.to_lowercase() == name)
    }

    pub fn deal(&self, restaurant_id: &str, deal_id: &str) -> Option<(&Restaurant, &Deal)> {
        let restaurant = self.find(restaurant_id)?;
        let deal = restaurant.find_deal(deal_id)?;
        Some((restaurant, deal))
    }

    /// Tags shown on a dining-group card: the restaurant's tags, falling
    /// back to its food types, at most five
    pub fn group_tags(&self, restaurant_name: &str) -> Vec<String> {
        let Some(restaurant) = self.find_by_name(restaurant_name) else {
            return Vec::new();
        };

        let source = if restaurant.tags.is_empty() {
            &restaurant.food_types
        } else {
            &restaurant.tags
        };
        source.iter().take(GROUP_TAG_LIMIT).cloned().collect()
    }
}

/// Errors that can occur while loading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse catalog {path:?}: {error}")]
    Parse { path: Option<PathBuf>, error: String },
}
