//! Catalog configuration.
//!
//! Passed explicitly into [`crate::Catalog`] and the stores it owns; nothing
//! in this crate reads global settings.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogResult, FieldErrors};

/// Tunables for the catalog engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Page size used when a query does not name one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper clamp for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum number of category levels (root = level 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of nodes a single descendant walk may visit.
    #[serde(default = "default_traversal_budget")]
    pub traversal_budget: usize,

    /// Stock level at or below which a product counts as low stock.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,

    /// Descriptions longer than this get a truncated short description.
    #[serde(default = "default_short_description_limit")]
    pub short_description_limit: usize,
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_max_depth() -> usize {
    5
}

fn default_traversal_budget() -> usize {
    10_000
}

fn default_low_stock_threshold() -> u32 {
    10
}

fn default_short_description_limit() -> usize {
    500
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_depth: default_max_depth(),
            traversal_budget: default_traversal_budget(),
            low_stock_threshold: default_low_stock_threshold(),
            short_description_limit: default_short_description_limit(),
        }
    }
}

impl CatalogConfig {
    /// Check the settings for internal consistency.
    pub fn validate(&self) -> CatalogResult<()> {
        let mut errors = FieldErrors::new();

        if self.max_page_size == 0 {
            errors.add("max_page_size", "must be at least 1");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            errors.add(
                "default_page_size",
                format!("must be between 1 and max_page_size ({})", self.max_page_size),
            );
        }
        if self.max_depth == 0 {
            errors.add("max_depth", "must allow at least one level");
        }
        if self.traversal_budget == 0 {
            errors.add("traversal_budget", "must be at least 1");
        }
        if self.short_description_limit < 4 {
            errors.add("short_description_limit", "must be at least 4");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.max_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CatalogConfig = serde_json::from_str(r#"{"max_depth": 3}"#).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn test_validate_reports_every_field() {
        let config = CatalogConfig {
            default_page_size: 500,
            max_depth: 0,
            ..CatalogConfig::default()
        };
        let err = config.validate().unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("default_page_size"));
        assert!(fields.contains("max_depth"));
    }
}
