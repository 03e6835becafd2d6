//! CLI command implementations.

pub mod categories;
pub mod config;
pub mod products;
pub mod request;

use clap::{Args, Subcommand};

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Subcommand)]
pub enum CategoriesCommand {
    /// List categories in display order.
    List {
        /// Only children of this category id (`root` for top level).
        #[arg(short, long)]
        parent: Option<String>,

        /// Include inactive categories.
        #[arg(short, long)]
        all: bool,
    },
    /// Show the tree of active categories.
    Tree,
    /// Show one category with its path and counts.
    Show {
        /// Category id or slug.
        category: String,
    },
    /// Create a category.
    Create {
        /// Display name; the slug is derived from it.
        name: String,

        /// Parent category id.
        #[arg(short, long)]
        parent: Option<u64>,

        /// Description.
        #[arg(long)]
        description: Option<String>,

        /// Position among siblings.
        #[arg(short, long, default_value = "0")]
        sort_order: i32,

        /// Create the category inactive.
        #[arg(long)]
        inactive: bool,
    },
    /// Move a category under a new parent.
    Move {
        /// Category id.
        id: u64,

        /// New parent id; omit to make it a root.
        #[arg(long)]
        to: Option<u64>,
    },
    /// Rename a category (its slug follows).
    Rename {
        /// Category id.
        id: u64,

        /// New name.
        name: String,
    },
    /// Mark a category active. Descendants are not changed.
    Activate {
        /// Category id.
        id: u64,
    },
    /// Mark a category inactive. Descendants are not changed.
    Deactivate {
        /// Category id.
        id: u64,
    },
    /// Delete a category; its children become roots.
    Delete {
        /// Category id.
        id: u64,

        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

/// Listing filters, mirroring the query parameters of `GET /products/`.
#[derive(Args, Default)]
pub struct ListFilters {
    /// Category id.
    #[arg(long)]
    pub category: Option<String>,

    /// Include products in descendant categories.
    #[arg(short = 'D', long)]
    pub include_descendants: bool,

    /// Minimum price (inclusive).
    #[arg(long)]
    pub min_price: Option<String>,

    /// Maximum price (inclusive).
    #[arg(long)]
    pub max_price: Option<String>,

    /// Search text matched against name and descriptions.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort field: name, price, or created_at.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort direction: asc or desc.
    #[arg(long)]
    pub order: Option<String>,

    /// Page number (1-indexed).
    #[arg(long)]
    pub page: Option<String>,

    /// Page size (clamped to the configured maximum).
    #[arg(long)]
    pub per_page: Option<String>,

    /// Include inactive products and hidden categories.
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum ProductsCommand {
    /// List products with filters, sorting, and pagination.
    List(ListFilters),
    /// Show one product.
    Show {
        /// Product id or slug.
        product: String,
    },
    /// Adjust stock by a signed delta.
    Stock {
        /// Product id.
        id: u64,

        /// Units to add (negative to remove).
        #[arg(allow_hyphen_values = true)]
        delta: i64,

        /// Acting seller id; defaults to the product owner.
        #[arg(long)]
        seller: Option<u64>,
    },
    /// Print the SQL a listing would run against the relational store.
    Sql(ListFilters),
}

/// Arguments for the request command.
#[derive(Args)]
pub struct RequestArgs {
    /// Path and query, e.g. `/products/?sort=price&order=asc`.
    pub path: String,

    /// Print only the response body.
    #[arg(short, long)]
    pub body_only: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration and the snapshot it points at.
    Validate,
}
