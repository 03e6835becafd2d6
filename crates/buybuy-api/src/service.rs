//! The request entry point: context, routing, dispatch, response.

use buybuy_catalog::Catalog;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use tracing::error;

use crate::context::{RequestContext, REQUEST_ID_HEADER};
use crate::envelope::Envelope;
use crate::error::ApiResult;
use crate::handlers;
use crate::logging::AccessRecord;
use crate::routes::Route;

/// Read-only HTTP surface over a shared [`Catalog`].
#[derive(Clone)]
pub struct CatalogApi {
    catalog: Catalog,
}

impl CatalogApi {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle one request. Never fails: every error becomes an error envelope
    /// with the matching status.
    pub fn handle<B>(&self, request: &Request<B>) -> Response<String> {
        let ctx = RequestContext::from_request(request);
        self.handle_context(&ctx)
    }

    /// Handle a request already turned into a context.
    pub fn handle_context(&self, ctx: &RequestContext) -> Response<String> {
        let route = Route::resolve(&ctx.method, &ctx.path);
        let pattern = route.as_ref().ok().map(Route::pattern);

        let (status, envelope) = match route.and_then(|route| self.dispatch(route, ctx)) {
            Ok(envelope) => (StatusCode::OK, envelope),
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    error!(request_id = %ctx.request_id, error = %e, "handler failed");
                }
                (status, Envelope::error(&e))
            }
        };

        AccessRecord::new(ctx, pattern, status).emit();

        let body = if ctx.method == Method::HEAD {
            String::new()
        } else {
            envelope.to_json()
        };
        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(id) = HeaderValue::from_str(&ctx.request_id.0) {
            headers.insert(REQUEST_ID_HEADER, id);
        }
        response
    }

    /// Run the handler for a matched route.
    pub fn dispatch(&self, route: Route, ctx: &RequestContext) -> ApiResult<Envelope> {
        let catalog = &self.catalog;
        match route {
            Route::CategoryList => handlers::list_categories(catalog, ctx),
            Route::CategoryTree => handlers::category_tree(catalog),
            Route::CategoryDetail(id) => handlers::category_detail(catalog, id),
            Route::CategoryChildren(id) => handlers::category_children(catalog, id),
            Route::CategoryProducts(id) => handlers::category_products(catalog, id, ctx),
            Route::ProductList => handlers::list_products(catalog, ctx),
            Route::ProductDetail(id) => handlers::product_detail(catalog, id),
        }
    }
}
