//! Route table.

use buybuy_catalog::{CategoryId, ProductId};
use http::Method;

use crate::error::{ApiError, ApiResult};

/// A matched route with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CategoryList,
    CategoryTree,
    CategoryDetail(CategoryId),
    CategoryChildren(CategoryId),
    CategoryProducts(CategoryId),
    ProductList,
    ProductDetail(ProductId),
}

impl Route {
    /// Match a method and path.
    ///
    /// The trailing slash is optional. A non-numeric id does not match any
    /// route. Every route is read-only, so other methods are refused.
    pub fn resolve(method: &Method, path: &str) -> ApiResult<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let route = match segments.as_slice() {
            ["categories"] => Some(Route::CategoryList),
            ["categories", "tree"] => Some(Route::CategoryTree),
            ["categories", id] => id.parse().ok().map(Route::CategoryDetail),
            ["categories", id, "children"] => id.parse().ok().map(Route::CategoryChildren),
            ["categories", id, "products"] => id.parse().ok().map(Route::CategoryProducts),
            ["products"] => Some(Route::ProductList),
            ["products", id] => id.parse().ok().map(Route::ProductDetail),
            _ => None,
        };

        let route = route.ok_or_else(|| ApiError::RouteNotFound(path.to_string()))?;
        if *method != Method::GET && *method != Method::HEAD {
            return Err(ApiError::MethodNotAllowed(method.clone()));
        }
        Ok(route)
    }

    /// Route pattern, used as the low-cardinality name in access logs.
    pub fn pattern(&self) -> &'static str {
        match self {
            Route::CategoryList => "/categories/",
            Route::CategoryTree => "/categories/tree/",
            Route::CategoryDetail(_) => "/categories/{id}/",
            Route::CategoryChildren(_) => "/categories/{id}/children/",
            Route::CategoryProducts(_) => "/categories/{id}/products/",
            Route::ProductList => "/products/",
            Route::ProductDetail(_) => "/products/{id}/",
        }
    }
}
