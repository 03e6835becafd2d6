//! Product gallery images and specification attributes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::ids::ImageId;

/// Longest accepted image alt text.
pub const MAX_ALT_TEXT_LEN: usize = 255;
/// Longest accepted specification name.
pub const MAX_SPEC_NAME_LEN: usize = 100;
/// Longest accepted specification value.
pub const MAX_SPEC_VALUE_LEN: usize = 255;

/// An image in a product's gallery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    /// Unique image identifier.
    pub id: ImageId,
    /// URL or path of the image file.
    pub image_url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: String,
    /// At most one image per product is primary.
    #[serde(default)]
    pub is_primary: bool,
    /// Gallery position.
    #[serde(default)]
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a gallery image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProductImage {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: u32,
}

impl NewProductImage {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            alt_text: String::new(),
            is_primary: false,
            sort_order: 0,
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    pub fn with_sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Make this the product's primary image.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// A named product attribute (e.g., Screen Size: 6.1 inches).
///
/// Names are unique within one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSpecification {
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for ProductSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Order a gallery by position, then age, then id.
pub(crate) fn sort_gallery(images: &mut [ProductImage]) {
    images.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Make `id` the only primary image. Returns `false` if no image has that id.
pub(crate) fn set_primary(images: &mut [ProductImage], id: ImageId) -> bool {
    if !images.iter().any(|image| image.id == id) {
        return false;
    }
    for image in images.iter_mut() {
        image.is_primary = image.id == id;
    }
    true
}

/// Trimmed url and alt text, or `None` with the problems recorded.
pub(crate) fn validate_image(
    input: &NewProductImage,
    errors: &mut FieldErrors,
) -> Option<(String, String)> {
    let url = input.image_url.trim();
    let alt_text = input.alt_text.trim();
    let mut ok = true;

    if url.is_empty() {
        errors.add("image_url", "must not be empty");
        ok = false;
    } else if url.chars().any(char::is_whitespace) {
        errors.add("image_url", "must not contain whitespace");
        ok = false;
    }
    if alt_text.chars().count() > MAX_ALT_TEXT_LEN {
        errors.add(
            "alt_text",
            format!("must be at most {} characters", MAX_ALT_TEXT_LEN),
        );
        ok = false;
    }

    ok.then(|| (url.to_string(), alt_text.to_string()))
}

/// Trimmed name and value, or `None` with the problems recorded.
pub(crate) fn validate_specification(
    name: &str,
    value: &str,
    errors: &mut FieldErrors,
) -> Option<(String, String)> {
    let name = name.trim();
    let value = value.trim();
    let mut ok = true;

    for (field, text, limit) in [
        ("name", name, MAX_SPEC_NAME_LEN),
        ("value", value, MAX_SPEC_VALUE_LEN),
    ] {
        if text.is_empty() {
            errors.add(field, "must not be empty");
            ok = false;
        } else if text.chars().count() > limit {
            errors.add(field, format!("must be at most {} characters", limit));
            ok = false;
        }
    }

    ok.then(|| (name.to_string(), value.to_string()))
}
