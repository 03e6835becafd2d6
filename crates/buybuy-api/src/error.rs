//! Boundary errors and their status codes.

use buybuy_catalog::{CatalogError, FieldErrors};
use http::{Method, StatusCode};
use thiserror::Error;

/// Errors surfaced by the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Error raised by the catalog core.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// No route matches the path.
    #[error("No route for {0}")]
    RouteNotFound(String),

    /// The route exists but not for this method.
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// Response could not be rendered.
    #[error("Failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(e) => match e {
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
                CatalogError::Conflict(_) => StatusCode::CONFLICT,
                CatalogError::Forbidden(_) => StatusCode::FORBIDDEN,
                // A walk over budget means the request asked for too much.
                CatalogError::TraversalLimit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CatalogError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field errors to render under `errors`, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Catalog(e) => e.field_errors(),
            _ => None,
        }
    }

    /// Message shown to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Catalog(CatalogError::Validation(_)) => "Invalid request parameters".to_string(),
            e if e.status().is_server_error() => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

/// Result alias for boundary handlers.
pub type ApiResult<T> = Result<T, ApiError>;
