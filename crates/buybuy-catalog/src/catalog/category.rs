//! Category types for product organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;

/// Longest accepted category name.
pub const MAX_NAME_LEN: usize = 200;

/// Largest accepted sort position.
pub const MAX_SORT_ORDER: i32 = 9999;

/// A product category in the catalog hierarchy.
///
/// The hierarchy is stored by id: `parent_id` points at another category in
/// the same store, never at an in-memory object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL-friendly slug, unique across the whole tree.
    pub slug: String,
    /// Category description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parent category ID (None for root categories).
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// Whether the category is visible and usable.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Display order within the parent.
    #[serde(default)]
    pub sort_order: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// Check if this is a root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Breadcrumb entry for this category.
    pub fn crumb(&self) -> Breadcrumb {
        Breadcrumb {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl NewCategory {
    /// Create an active root category input.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parent_id: None,
            is_active: true,
            sort_order: 0,
        }
    }

    /// Place the category under a parent.
    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sort position.
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Create the category deactivated.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// One step of a root-to-node path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Breadcrumb {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A category with its nested children, for tree rendering.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Number of nodes in this subtree, including the root.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}
