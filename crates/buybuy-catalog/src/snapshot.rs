//! JSON snapshots of the whole catalog.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, CategoryStore, Product, ProductStore};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized catalog state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl CatalogSnapshot {
    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CatalogError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild the stores, checking every cross-reference.
    pub fn into_stores(self, config: &CatalogConfig) -> CatalogResult<(CategoryStore, ProductStore)> {
        let categories = CategoryStore::from_categories(config, self.categories)?;
        let products = ProductStore::from_products(config, self.products, &categories)?;
        Ok((categories, products))
    }

    /// Capture the current contents of the stores.
    pub fn capture(categories: &CategoryStore, products: &ProductStore) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            categories: categories.to_vec(),
            products: products.to_vec(),
        }
    }
}
