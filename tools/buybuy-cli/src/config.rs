//! CLI configuration.

use anyhow::{Context, Result};
use buybuy_catalog::CatalogConfig;
use serde::{Deserialize, Serialize};

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 3] = ["buybuy.toml", ".buybuy.toml", "buybuy.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Catalog engine tunables.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Where the catalog snapshot lives.
    #[serde(default)]
    pub data: DataConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text; the format follows the file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Snapshot location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Catalog snapshot file, relative to the working directory.
    #[serde(default = "default_snapshot")]
    pub snapshot: String,

    /// Write changes back to the snapshot after mutating commands.
    #[serde(default = "default_true")]
    pub autosave: bool,
}

fn default_snapshot() -> String {
    "catalog.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
            autosave: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit log lines as JSON.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Generate a default buybuy.toml config file.
pub fn generate_default_config() -> String {
    r#"# BuyBuy catalog configuration

[catalog]
default_page_size = 20
max_page_size = 100
max_depth = 5
traversal_budget = 10000
low_stock_threshold = 10
short_description_limit = 500

[data]
snapshot = "catalog.json"
autosave = true

[logging]
# Overridden by RUST_LOG.
level = "warn"
json = false
"#
    .to_string()
}
