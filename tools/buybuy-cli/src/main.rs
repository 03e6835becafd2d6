//! BuyBuy CLI - Manage and query a catalog snapshot from the terminal.
//!
//! Commands:
//! - `buybuy categories` - Inspect and edit the category tree
//! - `buybuy products` - List, filter, and inspect products
//! - `buybuy request` - Run a read request through the HTTP boundary
//! - `buybuy config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CategoriesArgs, ConfigArgs, ProductsArgs, RequestArgs};

/// BuyBuy CLI - Manage the marketplace catalog
#[derive(Parser)]
#[command(name = "buybuy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Catalog snapshot path (overrides the config file)
    #[arg(short, long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the category tree
    Categories(CategoriesArgs),

    /// List, filter, and inspect products
    Products(ProductsArgs),

    /// Run a GET request against the catalog API and print the response
    Request(RequestArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let ctx = context::Context::load(cli.config.as_deref(), cli.data.as_deref(), output)?;
    init_tracing(&ctx, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Categories(args) => commands::categories::run(args, &ctx).await,
        Commands::Products(args) => commands::products::run(args, &ctx).await,
        Commands::Request(args) => commands::request::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the configured level; `--verbose`
/// raises the default to debug.
fn init_tracing(ctx: &context::Context, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        ctx.config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if ctx.config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        ctx.output.debug("tracing subscriber already installed");
    }
}
