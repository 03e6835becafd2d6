//! Search module.
//!
//! Query plans, filters, the catalog index, and paginated faceted results.

mod filter;
mod index;
mod query;
mod results;

pub use filter::{Filter, SqlParam};
pub use index::CatalogIndex;
pub use query::{
    parse_bool, CategoryFilter, QueryBuilder, QueryPlan, RawParams, SortDirection, SortField,
    SqlQuery,
};
pub use results::{CategoryFacet, FacetSummary, Pagination, PriceRange, SearchResults};
