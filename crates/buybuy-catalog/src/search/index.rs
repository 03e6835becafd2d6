//! Product catalog index: executes query plans against the stores.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::catalog::{CategoryStore, Product, ProductStore};
use crate::error::CatalogResult;
use crate::ids::CategoryId;
use crate::search::query::{QueryPlan, SortDirection, SortField};
use crate::search::results::{CategoryFacet, FacetSummary, Pagination, PriceRange, SearchResults};

/// Read-only view over the category tree and products.
#[derive(Debug, Clone, Copy)]
pub struct CatalogIndex<'a> {
    categories: &'a CategoryStore,
    products: &'a ProductStore,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(categories: &'a CategoryStore, products: &'a ProductStore) -> Self {
        Self {
            categories,
            products,
        }
    }

    /// Run a listing.
    ///
    /// An empty result is a normal page with zero items, not an error.
    pub fn list(&self, plan: &QueryPlan) -> CatalogResult<SearchResults<Product>> {
        let started = Instant::now();
        let filters = plan.filters(self.categories)?;
        let (category_filters, other_filters): (Vec<_>, Vec<_>) =
            filters.iter().partition(|f| f.is_category());

        let mut matched: Vec<&Product> = Vec::new();
        let mut category_counts: BTreeMap<CategoryId, u64> = BTreeMap::new();

        for product in self.products.iter() {
            if !other_filters.iter().all(|f| f.matches(product)) {
                continue;
            }
            *category_counts.entry(product.category_id).or_insert(0) += 1;
            if category_filters.iter().all(|f| f.matches(product)) {
                matched.push(product);
            }
        }

        matched.sort_by(|a, b| compare(a, b, plan.sort, plan.direction));

        let total = matched.len() as u64;
        let pagination = Pagination::new(plan.page, plan.per_page, total);
        let items: Vec<Product> = matched
            .iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(plan.per_page as usize)
            .map(|p| (*p).clone())
            .collect();

        let selected = plan.category.map(|c| c.id);
        let categories = category_counts
            .into_iter()
            .filter_map(|(id, count)| {
                let category = self.categories.get(id).ok()?;
                Some(CategoryFacet {
                    id,
                    name: category.name.clone(),
                    slug: category.slug.clone(),
                    count,
                    selected: selected == Some(id),
                })
            })
            .collect();
        let facets = FacetSummary {
            categories,
            price: PriceRange::of(matched.iter().map(|p| p.price)),
        };

        let elapsed_us = started.elapsed().as_micros() as u64;
        debug!(
            total,
            page = plan.page,
            returned = items.len(),
            elapsed_us,
            "catalog listing executed"
        );

        Ok(SearchResults::new(items, pagination)
            .with_facets(facets)
            .with_query_time(elapsed_us))
    }
}

/// Order by the requested field, then by id ascending regardless of direction.
fn compare(a: &Product, b: &Product, field: SortField, direction: SortDirection) -> Ordering {
    let primary = match field {
        SortField::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase()),
        SortField::Price => a.price.cmp(&b.price),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}
