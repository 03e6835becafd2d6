//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use buybuy_catalog::{Catalog, CatalogSnapshot};
use tracing::{debug, info};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    /// Catalog snapshot file.
    pub snapshot_path: PathBuf,
}

impl Context {
    /// Load context from config file. `data` overrides the configured
    /// snapshot path.
    pub fn load(config_path: Option<&str>, data: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        let snapshot = data.unwrap_or(config.data.snapshot.as_str());
        let snapshot_path = resolve_path(&cwd, snapshot);

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
            snapshot_path,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Open the catalog snapshot, or an empty catalog when there is none yet.
    pub fn open_catalog(&self) -> Result<Catalog> {
        let path = &self.snapshot_path;
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Catalog::new(self.config.catalog.clone())?);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let snapshot = CatalogSnapshot::from_json(&content)
            .with_context(|| format!("Invalid snapshot: {}", path.display()))?;
        let catalog = Catalog::from_snapshot(self.config.catalog.clone(), snapshot)
            .with_context(|| format!("Inconsistent snapshot: {}", path.display()))?;

        debug!(
            path = %path.display(),
            categories = catalog.category_count(),
            products = catalog.product_count(),
            "snapshot loaded"
        );
        Ok(catalog)
    }

    /// Write the catalog back unless autosave is off.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        if !self.config.data.autosave {
            self.output.warn("autosave is disabled; changes were not written");
            return Ok(());
        }

        let path = &self.snapshot_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = catalog.snapshot().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

        info!(path = %path.display(), "snapshot saved");
        self.output.debug(&format!("Saved {}", path.display()));
        Ok(())
    }
}

/// Resolve a path relative to the working directory.
fn resolve_path(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}
