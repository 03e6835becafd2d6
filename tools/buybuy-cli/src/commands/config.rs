//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let catalog = &ctx.config.catalog;
    ctx.output.info("[catalog]");
    ctx.output.kv("default_page_size", &catalog.default_page_size.to_string());
    ctx.output.kv("max_page_size", &catalog.max_page_size.to_string());
    ctx.output.kv("max_depth", &catalog.max_depth.to_string());
    ctx.output.kv("traversal_budget", &catalog.traversal_budget.to_string());
    ctx.output.kv("low_stock_threshold", &catalog.low_stock_threshold.to_string());
    ctx.output.kv(
        "short_description_limit",
        &catalog.short_description_limit.to_string(),
    );

    ctx.output.info("[data]");
    ctx.output.kv("snapshot", &ctx.snapshot_path.display().to_string());
    ctx.output.kv("autosave", &ctx.config.data.autosave.to_string());

    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level);
    ctx.output.kv("json", &ctx.config.logging.json.to_string());

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = ctx.config.catalog.validate() {
        match e.field_errors() {
            Some(fields) => {
                for field in fields.fields() {
                    for msg in fields.get(field).unwrap_or_default() {
                        errors.push(format!("catalog.{} {}", field, msg));
                    }
                }
            }
            None => errors.push(e.to_string()),
        }
    }

    if ctx.config.catalog.max_page_size > 100 {
        warnings.push(format!(
            "catalog.max_page_size {} is above the public API limit of 100",
            ctx.config.catalog.max_page_size
        ));
    }

    if ctx.config.logging.level.trim().is_empty() {
        errors.push("logging.level must not be empty".to_string());
    }

    // The snapshot must load under this configuration (depth limits included).
    if ctx.snapshot_path.exists() {
        match ctx.open_catalog() {
            Ok(catalog) => ctx.output.kv(
                "snapshot",
                &format!(
                    "{} categories, {} products",
                    catalog.category_count(),
                    catalog.product_count()
                ),
            ),
            Err(e) => errors.push(format!("{:#}", e)),
        }
    } else {
        warnings.push(format!(
            "snapshot {} does not exist yet",
            ctx.snapshot_path.display()
        ));
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
