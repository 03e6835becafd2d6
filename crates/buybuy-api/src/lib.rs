//! Read-only HTTP boundary for the BuyBuy catalog.
//!
//! Turns `http::Request`s into catalog calls and renders every outcome in
//! the `{success, data, message, errors, meta}` envelope. Catalog errors map
//! to statuses here: validation 400, not found 404, conflict 409.
//!
//! # Example
//!
//! ```rust
//! use buybuy_api::CatalogApi;
//! use buybuy_catalog::{Catalog, CatalogConfig};
//!
//! let api = CatalogApi::new(Catalog::new(CatalogConfig::default()).unwrap());
//! let request = http::Request::builder()
//!     .uri("/products/?min_price=50&max_price=10")
//!     .body(())
//!     .unwrap();
//! let response = api.handle(&request);
//! assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
//! ```

pub mod context;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod service;

pub use context::{RequestContext, RequestId, REQUEST_ID_HEADER};
pub use envelope::{Envelope, Meta};
pub use error::{ApiError, ApiResult};
pub use handlers::ProductView;
pub use routes::Route;
pub use service::CatalogApi;
