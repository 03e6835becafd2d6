//! Product listing and stock commands.

use anyhow::{bail, Result};
use buybuy_catalog::catalog::Product;
use buybuy_catalog::search::{RawParams, SearchResults, SqlParam};
use buybuy_catalog::{Catalog, CatalogError, ProductId, SellerId};

use super::{ListFilters, ProductsArgs, ProductsCommand};
use crate::context::Context;
use crate::output::{status_badge, stock_badge};

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.open_catalog()?;

    match args.command {
        ProductsCommand::List(filters) => list(&catalog, &filters, ctx),
        ProductsCommand::Show { product } => show(&catalog, &product, ctx),
        ProductsCommand::Stock { id, delta, seller } => stock(&catalog, id, delta, seller, ctx),
        ProductsCommand::Sql(filters) => sql(&catalog, &filters, ctx),
    }
}

impl ListFilters {
    /// The same parameters `GET /products/` would receive.
    pub fn to_params(&self) -> RawParams {
        let mut raw = RawParams::new();
        let mut put = |key: &str, value: Option<&String>| {
            if let Some(value) = value {
                raw.insert(key.to_string(), value.clone());
            }
        };
        put("category", self.category.as_ref());
        put("min_price", self.min_price.as_ref());
        put("max_price", self.max_price.as_ref());
        put("search", self.search.as_ref());
        put("sort", self.sort.as_ref());
        put("order", self.order.as_ref());
        put("page", self.page.as_ref());
        put("per_page", self.per_page.as_ref());

        if self.include_descendants {
            raw.insert("include_descendants".to_string(), "true".to_string());
        }
        if self.all {
            raw.insert("is_active".to_string(), "false".to_string());
        }
        raw
    }
}

fn list(catalog: &Catalog, filters: &ListFilters, ctx: &Context) -> Result<()> {
    let results = catalog.query(&filters.to_params()).map_err(explain)?;

    if ctx.output.is_json() {
        ctx.output.json(&results);
        return Ok(());
    }

    print_results(catalog, &results, ctx);
    Ok(())
}

fn print_results(catalog: &Catalog, results: &SearchResults<Product>, ctx: &Context) {
    let p = &results.pagination;
    ctx.output.header(&format!(
        "Products {}-{} of {} (page {}/{})",
        p.start_item(),
        p.end_item(),
        p.total,
        p.page,
        p.total_pages
    ));
    if results.is_empty() {
        ctx.output.info("No products match");
        return;
    }

    let threshold = catalog.config().low_stock_threshold;
    let widths = [6, 32, 12, 14, 8];
    ctx.output
        .table_row(&["ID", "NAME", "PRICE", "STOCK", "STATUS"], &widths);
    for product in &results.items {
        let id = product.id.to_string();
        let price = product.price.display();
        let stock = stock_badge(product, threshold);
        let status = status_badge(product.is_active);
        ctx.output.table_row(
            &[
                id.as_str(),
                product.name.as_str(),
                price.as_str(),
                stock.as_str(),
                status.as_str(),
            ],
            &widths,
        );
    }

    if !results.facets.categories.is_empty() {
        ctx.output.info("Categories:");
        for facet in &results.facets.categories {
            let marker = if facet.selected { "*" } else { "" };
            ctx.output.list_item(&format!(
                "{}{} (#{}): {}",
                facet.name, marker, facet.id, facet.count
            ));
        }
    }
    if let Some(ref range) = results.facets.price {
        ctx.output
            .kv("price range", &format!("{} - {}", range.min.display(), range.max.display()));
    }
    ctx.output.kv("query time", &format!("{}us", results.query_time_us));
}

fn show(catalog: &Catalog, key: &str, ctx: &Context) -> Result<()> {
    let product = match key.parse::<ProductId>() {
        Ok(id) => catalog.product(id)?,
        Err(_) => match catalog.product_by_slug(key) {
            Some(product) => product,
            None => bail!("No product with id or slug '{}'", key),
        },
    };

    if ctx.output.is_json() {
        ctx.output.json(&product);
        return Ok(());
    }

    let threshold = catalog.config().low_stock_threshold;
    ctx.output.header(&product.name);
    ctx.output.kv("id", &product.id.to_string());
    ctx.output.kv("slug", &product.slug);
    ctx.output.kv("category", &catalog.full_path_label(product.category_id)?);
    ctx.output.kv("seller", &product.seller_id.to_string());
    ctx.output.kv("price", &product.price.display());
    if let (Some(compare), Some(discount)) = (product.compare_price, product.discount_percentage()) {
        ctx.output.kv(
            "compare at",
            &format!("{} ({:.0}% off)", compare.display(), discount),
        );
    }
    ctx.output.kv("stock", &stock_badge(&product, threshold));
    ctx.output.kv("status", &status_badge(product.is_active));
    if !product.short_description.is_empty() {
        ctx.output.kv("summary", &product.short_description);
    }
    if !product.specifications.is_empty() {
        ctx.output.header("Specifications");
        for spec in &product.specifications {
            ctx.output.list_item(&spec.to_string());
        }
    }
    if !product.images.is_empty() {
        ctx.output.header("Images");
        for image in &product.images {
            let marker = if image.is_primary { " (primary)" } else { "" };
            ctx.output
                .list_item(&format!("#{} {}{}", image.id, image.image_url, marker));
        }
    }
    Ok(())
}

fn stock(
    catalog: &Catalog,
    id: u64,
    delta: i64,
    seller: Option<u64>,
    ctx: &Context,
) -> Result<()> {
    let id = ProductId::new(id);
    let gate = match seller {
        Some(seller) => SellerId::new(seller),
        None => catalog.product(id)?.seller_id,
    };

    let updated = catalog.adjust_stock(&gate, id, delta).map_err(explain)?;
    ctx.save_catalog(catalog)?;

    if ctx.output.is_json() {
        ctx.output.json(&updated);
        return Ok(());
    }
    ctx.output.success(&format!(
        "'{}' now has {} in stock",
        updated.name,
        updated.stock_quantity.quantity()
    ));
    if updated.is_low_stock(catalog.config().low_stock_threshold) {
        ctx.output.warn("Stock is low");
    }
    Ok(())
}

fn sql(catalog: &Catalog, filters: &ListFilters, ctx: &Context) -> Result<()> {
    let plan = catalog.build_query(&filters.to_params()).map_err(explain)?;
    let query = catalog.to_sql(&plan)?;

    if ctx.output.is_json() {
        ctx.output.json(&query);
        return Ok(());
    }

    ctx.output.header("Select");
    println!("{}", query.select);
    ctx.output.header("Count");
    println!("{}", query.count);
    ctx.output.header("Parameters");
    for (i, param) in query.params.iter().enumerate() {
        let value = match param {
            SqlParam::Int(n) => n.to_string(),
            SqlParam::Text(s) => format!("'{}'", s),
            SqlParam::Bool(b) => b.to_string(),
        };
        ctx.output.kv(&format!("${}", i + 1), &value);
    }
    Ok(())
}

/// Spell out every field error instead of the one-line summary.
fn explain(err: CatalogError) -> anyhow::Error {
    match err.field_errors() {
        Some(fields) => {
            let details: Vec<String> = fields
                .fields()
                .flat_map(|field| {
                    fields
                        .get(field)
                        .unwrap_or_default()
                        .iter()
                        .map(move |msg| format!("{}: {}", field, msg))
                })
                .collect();
            anyhow::anyhow!("Invalid parameters\n  {}", details.join("\n  "))
        }
        None => err.into(),
    }
}
