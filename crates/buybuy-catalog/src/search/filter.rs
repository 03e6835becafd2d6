//! Listing filters, evaluated in memory or rendered as SQL.

use serde::Serialize;

use crate::catalog::Product;
use crate::ids::CategoryId;
use crate::money::Money;

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Bool(bool),
}

/// A resolved listing filter.
///
/// Id lists are kept sorted so membership is a binary search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
    /// Active product in a visible category.
    Active { visible_categories: Vec<CategoryId> },
    /// Exactly one category.
    Category(CategoryId),
    /// Any of several categories (a category and its subtree).
    Categories(Vec<CategoryId>),
    /// Inclusive price bounds.
    PriceRange {
        min: Option<Money>,
        max: Option<Money>,
    },
    /// Every lowercase term must occur in the name or description.
    Text(Vec<String>),
}

impl Filter {
    /// Create a price range filter.
    pub fn price_range(min: Option<Money>, max: Option<Money>) -> Self {
        Filter::PriceRange { min, max }
    }

    /// Whether this filter restricts by category.
    ///
    /// Category facets are counted with these filters left out.
    pub fn is_category(&self) -> bool {
        matches!(self, Filter::Category(_) | Filter::Categories(_))
    }

    /// Evaluate the filter against a product.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Filter::Active { visible_categories } => {
                product.is_active && visible_categories.binary_search(&product.category_id).is_ok()
            }
            Filter::Category(id) => product.category_id == *id,
            Filter::Categories(ids) => ids.binary_search(&product.category_id).is_ok(),
            Filter::PriceRange { min, max } => {
                min.map_or(true, |min| product.price >= min)
                    && max.map_or(true, |max| product.price <= max)
            }
            Filter::Text(terms) => product.matches_terms(terms),
        }
    }

    /// Build the SQL WHERE clause component.
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        match self {
            Filter::Active { visible_categories } => {
                if visible_categories.is_empty() {
                    return ("1=0".to_string(), vec![]);
                }
                let mut values = vec![SqlParam::Bool(true)];
                values.extend(id_params(visible_categories));
                (
                    format!(
                        "is_active = ? AND category_id IN ({})",
                        placeholders(visible_categories.len())
                    ),
                    values,
                )
            }
            Filter::Category(id) => (
                "category_id = ?".to_string(),
                vec![SqlParam::Int(id.get() as i64)],
            ),
            Filter::Categories(ids) => {
                if ids.is_empty() {
                    return ("1=0".to_string(), vec![]);
                }
                (
                    format!("category_id IN ({})", placeholders(ids.len())),
                    id_params(ids),
                )
            }
            Filter::PriceRange { min, max } => {
                let mut clauses = Vec::new();
                let mut values = Vec::new();
                if let Some(min) = min {
                    clauses.push("price_cents >= ?");
                    values.push(SqlParam::Int(min.cents()));
                }
                if let Some(max) = max {
                    clauses.push("price_cents <= ?");
                    values.push(SqlParam::Int(max.cents()));
                }
                if clauses.is_empty() {
                    return ("1=1".to_string(), values);
                }
                (clauses.join(" AND "), values)
            }
            Filter::Text(terms) => {
                if terms.is_empty() {
                    return ("1=1".to_string(), vec![]);
                }
                let mut values = Vec::new();
                let clauses: Vec<&str> = terms
                    .iter()
                    .map(|term| {
                        let pattern = format!("%{}%", escape_like(term));
                        values.push(SqlParam::Text(pattern.clone()));
                        values.push(SqlParam::Text(pattern));
                        "(LOWER(name) LIKE ? ESCAPE '\\' OR LOWER(description) LIKE ? ESCAPE '\\')"
                    })
                    .collect();
                (clauses.join(" AND "), values)
            }
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn id_params(ids: &[CategoryId]) -> Vec<SqlParam> {
    ids.iter().map(|id| SqlParam::Int(id.get() as i64)).collect()
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
