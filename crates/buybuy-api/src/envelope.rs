//! JSON response envelope shared by every route.

use buybuy_catalog::search::{FacetSummary, Pagination};
use buybuy_catalog::FieldErrors;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Listing metadata.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetSummary>,
}

/// `{success, data, message, errors, meta}` response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Envelope {
    pub success: bool,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    /// Successful response carrying `data`.
    pub fn ok(data: impl Serialize) -> Result<Self, ApiError> {
        Ok(Self {
            success: true,
            data: serde_json::to_value(data)?,
            message: None,
            errors: None,
            meta: None,
        })
    }

    /// Attach pagination info.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.meta.get_or_insert_with(Meta::default).pagination = Some(pagination);
        self
    }

    /// Attach facets.
    pub fn with_facets(mut self, facets: FacetSummary) -> Self {
        self.meta.get_or_insert_with(Meta::default).facets = Some(facets);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Failure response for an error.
    pub fn error(err: &ApiError) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: Some(err.public_message()),
            errors: err.field_errors().cloned(),
            meta: None,
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"data":null,"message":"Internal server error"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buybuy_catalog::CatalogError;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let envelope = Envelope::ok(json!({"id": 1}))
            .unwrap()
            .with_pagination(Pagination::new(1, 20, 1));
        let value: Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["meta"]["pagination"]["total_pages"], 1);
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_error_shape() {
        let mut fields = FieldErrors::new();
        fields.add("min_price", "must not exceed max_price");
        fields.add("sort", "unknown");
        let err = ApiError::from(CatalogError::Validation(fields));
        let value = serde_json::to_value(Envelope::error(&err)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["errors"]["min_price"][0], "must not exceed max_price");
        assert!(value["errors"]["sort"].is_array());
    }
}
