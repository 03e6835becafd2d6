//! Listing results, pagination, and facets.

use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;
use crate::money::Money;

/// Pagination info.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Current page (1-indexed).
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of matching items.
    pub total: u64,
    /// Total number of pages; 0 when nothing matched.
    pub total_pages: u64,
    /// Whether there's a next page.
    pub has_next: bool,
    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl Pagination {
    /// Create pagination info.
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(u64::from(per_page));

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }

    /// Offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Check if on last page (or past the end).
    pub fn is_last(&self) -> bool {
        u64::from(self.page) >= self.total_pages
    }

    /// Get start item number (1-indexed), 0 when the page is empty.
    pub fn start_item(&self) -> u64 {
        if self.offset() >= self.total {
            0
        } else {
            self.offset() + 1
        }
    }

    /// Get end item number.
    pub fn end_item(&self) -> u64 {
        if self.offset() >= self.total {
            return 0;
        }
        (self.offset() + u64::from(self.per_page)).min(self.total)
    }
}

/// Listing results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<T> {
    /// The items on the requested page.
    pub items: Vec<T>,
    /// Pagination info.
    pub pagination: Pagination,
    /// Facets over the filtered set.
    pub facets: FacetSummary,
    /// Execution time in microseconds.
    pub query_time_us: u64,
}

impl<T> SearchResults<T> {
    /// Create new results.
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            pagination,
            facets: FacetSummary::default(),
            query_time_us: 0,
        }
    }

    /// Set facets.
    pub fn with_facets(mut self, facets: FacetSummary) -> Self {
        self.facets = facets;
        self
    }

    /// Set query time.
    pub fn with_query_time(mut self, us: u64) -> Self {
        self.query_time_us = us;
        self
    }

    /// Check if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Convert the items, keeping pagination and facets.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResults<U> {
        SearchResults {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
            facets: self.facets,
            query_time_us: self.query_time_us,
        }
    }
}

/// Aggregates shown beside a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FacetSummary {
    /// Per-category counts, ignoring the category filter itself.
    pub categories: Vec<CategoryFacet>,
    /// Price bounds of the filtered set; `None` when it is empty.
    pub price: Option<PriceRange>,
}

impl FacetSummary {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.price.is_none()
    }
}

/// Product count for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryFacet {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub count: u64,
    /// Whether this is the category being filtered on.
    pub selected: bool,
}

/// Lowest and highest price in a set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    /// Bounds of a set of prices; `None` for an empty set.
    pub fn of(prices: impl IntoIterator<Item = Money>) -> Option<Self> {
        prices.into_iter().fold(None, |range, price| match range {
            None => Some(PriceRange {
                min: price,
                max: price,
            }),
            Some(r) => Some(PriceRange {
                min: r.min.min(price),
                max: r.max.max(price),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_basics() {
        let p = Pagination::new(2, 10, 45);
        assert_eq!(p.total_pages, 5);
        assert!(p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.offset(), 10);
        assert_eq!(p.start_item(), 11);
        assert_eq!(p.end_item(), 20);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = Pagination::new(5, 10, 45);
        assert!(!p.has_next);
        assert!(p.is_last());
        assert_eq!(p.end_item(), 45);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert_eq!(p.start_item(), 0);
        assert_eq!(p.end_item(), 0);
    }

    #[test]
    fn test_pagination_past_the_end() {
        let p = Pagination::new(9, 10, 45);
        assert!(!p.has_next);
        assert_eq!(p.start_item(), 0);
    }

    #[test]
    fn test_price_range_of() {
        assert_eq!(PriceRange::of(Vec::new()), None);
        let range = PriceRange::of([Money::from_units(5), Money::from_units(2), Money::from_units(9)]).unwrap();
        assert_eq!(range.min, Money::from_units(2));
        assert_eq!(range.max, Money::from_units(9));
    }
}
