//! Category hierarchy and product catalog query engine for BuyBuy.
//!
//! This crate provides the domain core of the marketplace catalog:
//!
//! - **Catalog**: the category tree (an id-keyed arena), products, stock
//! - **Search**: query plans built from raw parameters, filtering, sorting,
//!   pagination, facets, and SQL rendering of a plan
//! - **Service**: the lock-protected [`Catalog`] facade and JSON snapshots
//!
//! # Example
//!
//! ```rust
//! use buybuy_catalog::prelude::*;
//!
//! let catalog = Catalog::new(CatalogConfig::default()).unwrap();
//! let electronics = catalog.create_category(NewCategory::new("Electronics")).unwrap();
//! let phones = catalog
//!     .create_category(NewCategory::new("Smartphones").with_parent(electronics.id))
//!     .unwrap();
//! catalog
//!     .create_product(
//!         &SellerId::new(1),
//!         NewProduct::new("Pixel 8", "699.00".parse().unwrap(), phones.id).with_stock(3),
//!     )
//!     .unwrap();
//!
//! let mut raw = RawParams::new();
//! raw.insert("category".into(), electronics.id.to_string());
//! raw.insert("include_descendants".into(), "true".into());
//! let results = catalog.query(&raw).unwrap();
//! assert_eq!(results.pagination.total, 1);
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod money;
pub mod slug;

pub mod catalog;
pub mod search;
pub mod service;
pub mod snapshot;

pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult, FieldErrors};
pub use ids::*;
pub use money::Money;
pub use service::{Catalog, CategoryDetail};
pub use snapshot::CatalogSnapshot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::CatalogConfig;
    pub use crate::error::{CatalogError, CatalogResult, FieldErrors};
    pub use crate::ids::*;
    pub use crate::money::Money;
    pub use crate::service::{Catalog, CategoryDetail};
    pub use crate::snapshot::CatalogSnapshot;

    // Catalog
    pub use crate::catalog::{
        Breadcrumb, Category, CategoryNode, CategoryStore, NewCategory, NewProduct,
        NewProductImage, Product, ProductImage, ProductSpecification, ProductStore, ProductUpdate,
        PurchaseCheck, SellerGate, StaffGate, StockLevel,
    };

    // Search
    pub use crate::search::{
        CatalogIndex, CategoryFacet, FacetSummary, Pagination, PriceRange, QueryBuilder,
        QueryPlan, RawParams, SearchResults, SortDirection, SortField,
    };
}
