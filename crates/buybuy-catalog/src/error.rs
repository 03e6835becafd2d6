//! Catalog error types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Field-level validation messages, keyed by field name.
///
/// Every offending field is recorded, not just the first one found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Check whether any field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether a given field failed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Names of the failed fields, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Turn the collected messages into a result.
    pub fn into_result(self) -> Result<(), CatalogError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors that can occur in catalog operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Bad or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Unknown id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation blocked by existing references.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A tree walk visited more nodes than the configured budget allows.
    #[error("Traversal from category {id} exceeded the budget of {budget} nodes")]
    TraversalLimit { id: String, budget: usize },

    /// Caller failed the ownership gate.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Snapshot could not be decoded or violates an invariant.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl CatalogError {
    /// Validation failure on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation(FieldErrors::single(field, message))
    }

    /// Unknown category id.
    pub fn category_not_found(id: impl fmt::Display) -> Self {
        CatalogError::NotFound {
            entity: "Category",
            id: id.to_string(),
        }
    }

    /// Unknown product id.
    pub fn product_not_found(id: impl fmt::Display) -> Self {
        CatalogError::NotFound {
            entity: "Product",
            id: id.to_string(),
        }
    }

    /// Field errors carried by a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CatalogError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FieldErrors> for CatalogError {
    fn from(errors: FieldErrors) -> Self {
        CatalogError::Validation(errors)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Snapshot(e.to_string())
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_collect_every_field() {
        let mut errors = FieldErrors::new();
        errors.add("price", "min_price must not exceed max_price");
        errors.add("sort", "unknown sort field 'rating'");
        errors.add("sort", "second message");

        assert_eq!(errors.len(), 2);
        assert!(errors.contains("price"));
        assert_eq!(errors.get("sort").map(|m| m.len()), Some(2));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["price", "sort"]);
    }

    #[test]
    fn test_empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::single("name", "required").into_result().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = CatalogError::category_not_found(42);
        assert_eq!(err.to_string(), "Category not found: 42");

        let err = CatalogError::invalid("page", "must be at least 1");
        assert_eq!(err.to_string(), "Validation failed: page: must be at least 1");
    }

    #[test]
    fn test_field_errors_serialize_as_object() {
        let errors = FieldErrors::single("per_page", "must be an integer");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "per_page": ["must be an integer"] }));
    }
}
