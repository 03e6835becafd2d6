//! One handler per route. Each takes the catalog and the request context
//! and returns a ready envelope.

use buybuy_catalog::catalog::{Breadcrumb, Category, Product, ProductImage};
use buybuy_catalog::search::{parse_bool, Pagination, QueryBuilder, RawParams, SearchResults};
use buybuy_catalog::{Catalog, CatalogError, CategoryId, FieldErrors, ProductId};
use serde::Serialize;
use serde_json::json;

use crate::context::RequestContext;
use crate::envelope::Envelope;
use crate::error::ApiResult;

/// A product as rendered in listings and detail pages.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub is_in_stock: bool,
    pub is_low_stock: bool,
    pub is_on_sale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Gallery image flagged primary; `null` when none is.
    pub primary_image: Option<ProductImage>,
}

impl ProductView {
    pub fn new(product: Product, catalog: &Catalog) -> Self {
        let threshold = catalog.config().low_stock_threshold;
        Self {
            is_in_stock: product.is_in_stock(),
            is_low_stock: product.is_low_stock(threshold),
            is_on_sale: product.is_on_sale(),
            discount_percentage: product.discount_percentage(),
            category_name: catalog.category(product.category_id).ok().map(|c| c.name),
            primary_image: product.primary_image().cloned(),
            product,
        }
    }
}

/// `GET /categories/`: active categories, filterable by `parent`.
///
/// `parent=root` (or `null`) keeps top-level categories only;
/// `is_active=false` includes inactive ones.
pub fn list_categories(catalog: &Catalog, ctx: &RequestContext) -> ApiResult<Envelope> {
    let mut errors = FieldErrors::new();
    let (page, per_page) = QueryBuilder::new(catalog.config()).pagination(&ctx.query, &mut errors);

    let parent = match non_blank(ctx, "parent") {
        None => None,
        Some(v) if v.eq_ignore_ascii_case("root") || v.eq_ignore_ascii_case("null") => Some(None),
        Some(v) => match v.parse::<CategoryId>() {
            Ok(id) => Some(Some(id)),
            Err(_) => {
                errors.add("parent", format!("'{}' is not a valid category id", v));
                None
            }
        },
    };
    let active_only = match non_blank(ctx, "is_active") {
        None => true,
        Some(v) => parse_bool(v).unwrap_or_else(|| {
            errors.add("is_active", format!("'{}' is not a boolean", v));
            true
        }),
    };
    errors.into_result()?;

    let categories = catalog.list_categories(parent, active_only)?;
    let pagination = Pagination::new(page, per_page, categories.len() as u64);
    let details = categories
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(per_page as usize)
        .map(|c| catalog.category_detail(c.id))
        .collect::<Result<Vec<_>, CatalogError>>()?;

    Ok(Envelope::ok(details)?.with_pagination(pagination))
}

/// `GET /categories/tree/`: nested tree of active categories.
pub fn category_tree(catalog: &Catalog) -> ApiResult<Envelope> {
    Envelope::ok(catalog.tree())
}

/// `GET /categories/{id}/`
pub fn category_detail(catalog: &Catalog, id: CategoryId) -> ApiResult<Envelope> {
    Envelope::ok(catalog.category_detail(id)?)
}

/// `GET /categories/{id}/children/`: active direct children.
pub fn category_children(catalog: &Catalog, id: CategoryId) -> ApiResult<Envelope> {
    let parent = catalog.category(id)?;
    let children: Vec<Category> = catalog
        .children(id)?
        .into_iter()
        .filter(|c| c.is_active)
        .collect();

    Envelope::ok(json!({
        "parent": {
            "id": parent.id,
            "name": parent.name,
            "slug": parent.slug,
            "full_path": catalog.full_path(id)?,
        },
        "children_count": children.len(),
        "children": children,
    }))
}

/// `GET /categories/{id}/products/`: the product listing scoped to one
/// active category. Accepts every listing parameter except `category`;
/// `include_subcategories` is accepted as an alias of `include_descendants`.
pub fn category_products(
    catalog: &Catalog,
    id: CategoryId,
    ctx: &RequestContext,
) -> ApiResult<Envelope> {
    let category = catalog.category(id)?;
    if !category.is_active {
        return Err(CatalogError::category_not_found(id).into());
    }

    let mut raw: RawParams = ctx.query.clone();
    raw.insert("category".to_string(), id.to_string());
    if let Some(alias) = raw.remove("include_subcategories") {
        raw.entry("include_descendants".to_string()).or_insert(alias);
    }

    let results = catalog.query(&raw)?;
    let path: Vec<Breadcrumb> = catalog.full_path(id)?;
    let SearchResults {
        items,
        pagination,
        facets,
        ..
    } = results.map(|p| ProductView::new(p, catalog));

    Ok(Envelope::ok(json!({
        "category": {
            "id": category.id,
            "name": category.name,
            "slug": category.slug,
            "full_path": path,
            "total_products": pagination.total,
        },
        "products": items,
    }))?
    .with_pagination(pagination)
    .with_facets(facets))
}

/// `GET /products/`: filtered, sorted, paginated, faceted listing.
pub fn list_products(catalog: &Catalog, ctx: &RequestContext) -> ApiResult<Envelope> {
    let SearchResults {
        items,
        pagination,
        facets,
        ..
    } = catalog.query(&ctx.query)?.map(|p| ProductView::new(p, catalog));

    Ok(Envelope::ok(items)?
        .with_pagination(pagination)
        .with_facets(facets))
}

/// `GET /products/{id}/`: only products that would appear in a default
/// listing are reachable.
pub fn product_detail(catalog: &Catalog, id: ProductId) -> ApiResult<Envelope> {
    let product = catalog.product(id)?;
    let visible = product.is_active && catalog.category_detail(product.category_id)?.is_visible;
    if !visible {
        return Err(CatalogError::product_not_found(id).into());
    }

    let category_path = catalog.full_path(product.category_id)?;
    let view = ProductView::new(product, catalog);
    Envelope::ok(json!({
        "product": view,
        "category_path": category_path,
    }))
}

fn non_blank<'a>(ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
    ctx.query_param(name).map(str::trim).filter(|v| !v.is_empty())
}
