//! Listing query plans and the builder that validates raw parameters.

use std::collections::HashMap;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CategoryStore;
use crate::config::CatalogConfig;
use crate::error::{CatalogResult, FieldErrors};
use crate::ids::CategoryId;
use crate::money::Money;
use crate::search::filter::{Filter, SqlParam};

/// Raw request parameters: name to (already decoded) value.
pub type RawParams = HashMap<String, String>;

/// Field a listing may be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Price,
    #[default]
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Name, SortField::Price, SortField::CreatedAt];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::CreatedAt => "created_at",
        }
    }

    /// Column expression used in ORDER BY.
    pub fn sql_column(&self) -> &'static str {
        match self {
            SortField::Name => "LOWER(name)",
            SortField::Price => "price_cents",
            SortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "created_at" => Ok(SortField::CreatedAt),
            other => Err(format!(
                "'{}' is not a sortable field; expected one of name, price, created_at",
                other
            )),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("'{}' is not a direction; expected asc or desc", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restriction to one category, optionally with its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub id: CategoryId,
    pub include_descendants: bool,
}

/// A validated, normalized listing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub category: Option<CategoryFilter>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Hide inactive products and products in hidden categories.
    pub active_only: bool,
    /// Trimmed search text; never empty.
    pub search: Option<String>,
    pub sort: SortField,
    pub direction: SortDirection,
    /// Current page (1-indexed).
    pub page: u32,
    pub per_page: u32,
    /// Upper bound for `per_page`, taken from the config.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

fn default_max_per_page() -> u32 {
    100
}

impl QueryPlan {
    /// Plan listing every visible product, newest first.
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            active_only: true,
            search: None,
            sort: SortField::CreatedAt,
            direction: SortDirection::Desc,
            page: 1,
            per_page: config.default_page_size.clamp(1, config.max_page_size.max(1)),
            max_per_page: config.max_page_size.max(1),
        }
    }

    pub fn with_category(mut self, id: CategoryId, include_descendants: bool) -> Self {
        self.category = Some(CategoryFilter {
            id,
            include_descendants,
        });
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Set the search text; blank text clears it.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let text = text.trim();
        self.search = (!text.is_empty()).then(|| text.to_string());
        self
    }

    pub fn with_sort(mut self, sort: SortField, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    /// Set pagination; the page size is clamped to `1..=max_per_page`.
    pub fn with_pagination(mut self, page: u32, per_page: u32) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.clamp(1, self.max_per_page.max(1));
        self
    }

    /// Include inactive products and hidden categories.
    pub fn include_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    /// Offset of the first item on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Lowercased whitespace-separated search terms.
    pub fn search_terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default()
    }

    /// Resolve the plan into concrete filters against the category tree.
    ///
    /// Descendant ids and the visible-category set are computed here, so
    /// the result no longer depends on the store.
    pub fn filters(&self, categories: &CategoryStore) -> CatalogResult<Vec<Filter>> {
        let mut filters = Vec::new();

        if self.active_only {
            let mut visible: Vec<CategoryId> = categories.visible_ids().into_iter().collect();
            visible.sort();
            filters.push(Filter::Active {
                visible_categories: visible,
            });
        }

        if let Some(category) = self.category {
            if category.include_descendants {
                let mut ids: Vec<CategoryId> = categories.subtree(category.id)?.into_iter().collect();
                ids.sort();
                filters.push(Filter::Categories(ids));
            } else {
                categories.get(category.id)?;
                filters.push(Filter::Category(category.id));
            }
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            filters.push(Filter::price_range(self.min_price, self.max_price));
        }

        let terms = self.search_terms();
        if !terms.is_empty() {
            filters.push(Filter::Text(terms));
        }

        Ok(filters)
    }

    /// Render the plan as parameterized SQL for the relational store.
    pub fn to_sql(&self, categories: &CategoryStore) -> CatalogResult<SqlQuery> {
        let filters = self.filters(categories)?;

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for filter in &filters {
            let (clause, values) = filter.to_sql();
            clauses.push(format!("({})", clause));
            params.extend(values);
        }
        let where_clause = if clauses.is_empty() {
            "1=1".to_string()
        } else {
            clauses.join(" AND ")
        };

        let direction = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };

        let select = format!(
            "SELECT * FROM products WHERE {} ORDER BY {} {}, id ASC LIMIT {} OFFSET {}",
            where_clause,
            self.sort.sql_column(),
            direction,
            self.per_page,
            self.offset()
        );
        let count = format!("SELECT COUNT(*) AS count FROM products WHERE {}", where_clause);

        Ok(SqlQuery {
            select,
            count,
            params,
        })
    }
}

/// SQL text for one listing: the page query and its count query share params.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub select: String,
    pub count: String,
    pub params: Vec<SqlParam>,
}

/// Turns raw request parameters into a [`QueryPlan`].
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    config: &'a CatalogConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a CatalogConfig) -> Self {
        Self { config }
    }

    /// Validate and normalize raw parameters.
    ///
    /// Every malformed field is reported in one `Validation` error. The
    /// category store is consulted only after all fields are well formed;
    /// an unknown category id then yields `NotFound`.
    pub fn build(&self, raw: &RawParams, categories: &CategoryStore) -> CatalogResult<QueryPlan> {
        let plan = self.parse(raw)?;
        if let Some(category) = plan.category {
            categories.get(category.id)?;
        }
        debug!(?plan, "query plan built");
        Ok(plan)
    }

    /// Field validation only; touches no store.
    pub fn parse(&self, raw: &RawParams) -> CatalogResult<QueryPlan> {
        let mut errors = FieldErrors::new();
        let mut plan = QueryPlan::new(self.config);

        let category = value(raw, "category").and_then(|v| match v.parse::<CategoryId>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("category", format!("'{}' is not a valid category id", v));
                None
            }
        });
        let include_descendants = value(raw, "include_descendants")
            .and_then(|v| boolean(&mut errors, "include_descendants", v))
            .unwrap_or(false);
        if let Some(id) = category {
            plan = plan.with_category(id, include_descendants);
        }

        plan.min_price = value(raw, "min_price").and_then(|v| price(&mut errors, "min_price", v));
        plan.max_price = value(raw, "max_price").and_then(|v| price(&mut errors, "max_price", v));
        if let (Some(min), Some(max)) = (plan.min_price, plan.max_price) {
            if min > max {
                errors.add("min_price", "must not exceed max_price");
            }
        }

        if let Some(active) = value(raw, "is_active").and_then(|v| boolean(&mut errors, "is_active", v)) {
            plan.active_only = active;
        }

        if let Some(search) = raw.get("search") {
            plan = plan.with_search(search.as_str());
        }

        if let Some(sort) = value(raw, "sort") {
            match sort.parse::<SortField>() {
                Ok(field) => plan.sort = field,
                Err(e) => errors.add("sort", e),
            }
        }
        if let Some(order) = value(raw, "order") {
            match order.parse::<SortDirection>() {
                Ok(direction) => plan.direction = direction,
                Err(e) => errors.add("order", e),
            }
        }

        let (page, per_page) = self.pagination(raw, &mut errors);
        plan.page = page;
        plan.per_page = per_page;

        if let Err(e) = errors.into_result() {
            debug!(error = %e, "query parameters rejected");
            return Err(e);
        }
        Ok(plan)
    }

    /// Read `page` and `per_page`, recording malformed values in `errors`.
    ///
    /// The page size falls back to the configured default and is clamped to
    /// `1..=max_page_size`.
    pub fn pagination(&self, raw: &RawParams, errors: &mut FieldErrors) -> (u32, u32) {
        let max = self.config.max_page_size.max(1);
        let mut page = 1;
        let mut per_page = self.config.default_page_size.clamp(1, max);

        if let Some(v) = value(raw, "page") {
            match v.parse::<u32>() {
                Ok(0) => errors.add("page", "must be at least 1"),
                Ok(n) => page = n,
                Err(_) => errors.add("page", format!("'{}' is not a positive integer", v)),
            }
        }

        if let Some(v) = value(raw, "per_page") {
            match v.parse::<i64>() {
                Ok(n) => per_page = n.clamp(1, i64::from(max)) as u32,
                Err(e) => match e.kind() {
                    IntErrorKind::PosOverflow => per_page = max,
                    IntErrorKind::NegOverflow => per_page = 1,
                    _ => errors.add("per_page", format!("'{}' is not an integer", v)),
                },
            }
        }

        (page, per_page)
    }
}

/// Parse a boolean flag: `true/false`, `1/0`, `yes/no` (any case).
pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Non-blank trimmed value of a parameter.
fn value<'r>(raw: &'r RawParams, key: &str) -> Option<&'r str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn boolean(errors: &mut FieldErrors, field: &str, v: &str) -> Option<bool> {
    let parsed = parse_bool(v);
    if parsed.is_none() {
        errors.add(field, format!("'{}' is not a boolean", v));
    }
    parsed
}

fn price(errors: &mut FieldErrors, field: &str, v: &str) -> Option<Money> {
    match v.parse::<Money>() {
        Ok(m) if m.is_negative() => {
            errors.add(field, "must be at least 0");
            None
        }
        Ok(m) => Some(m),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewCategory;
    use crate::error::CatalogError;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn categories() -> CategoryStore {
        let config = CatalogConfig::default();
        let mut store = CategoryStore::new(&config);
        let root = store.create(NewCategory::new("Electronics")).unwrap();
        store
            .create(NewCategory::new("Smartphones").with_parent(root.id))
            .unwrap();
        store
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        let plan = QueryBuilder::new(&config).parse(&RawParams::new()).unwrap();
        assert_eq!(plan.page, 1);
        assert_eq!(plan.per_page, 20);
        assert_eq!(plan.sort, SortField::CreatedAt);
        assert_eq!(plan.direction, SortDirection::Desc);
        assert!(plan.active_only);
        assert!(plan.category.is_none());
    }

    #[test]
    fn test_per_page_is_clamped() {
        let config = CatalogConfig::default();
        let builder = QueryBuilder::new(&config);
        assert_eq!(builder.parse(&params(&[("per_page", "500")])).unwrap().per_page, 100);
        assert_eq!(builder.parse(&params(&[("per_page", "0")])).unwrap().per_page, 1);
        assert_eq!(builder.parse(&params(&[("per_page", "-3")])).unwrap().per_page, 1);
        assert!(builder.parse(&params(&[("per_page", "ten")])).is_err());
    }

    #[test]
    fn test_per_page_beyond_integer_range_is_clamped() {
        let config = CatalogConfig::default();
        let builder = QueryBuilder::new(&config);
        let huge = builder
            .parse(&params(&[("per_page", "99999999999999999999")]))
            .unwrap();
        assert_eq!(huge.per_page, 100);
        let tiny = builder
            .parse(&params(&[("per_page", "-99999999999999999999")]))
            .unwrap();
        assert_eq!(tiny.per_page, 1);
        let err = builder
            .parse(&params(&[("per_page", "9e99")]))
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("per_page"));
    }

    #[test]
    fn test_with_pagination_uses_configured_max() {
        let config = CatalogConfig {
            max_page_size: 50,
            ..CatalogConfig::default()
        };
        let plan = QueryPlan::new(&config).with_pagination(1, 80);
        assert_eq!(plan.per_page, 50);

        let plan = QueryPlan::new(&CatalogConfig::default()).with_pagination(0, 80);
        assert_eq!((plan.page, plan.per_page), (1, 80));
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let config = CatalogConfig::default();
        let err = QueryBuilder::new(&config)
            .parse(&params(&[
                ("sort", "rating"),
                ("order", "up"),
                ("page", "0"),
                ("min_price", "abc"),
                ("is_active", "maybe"),
            ]))
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        for field in ["sort", "order", "page", "min_price", "is_active"] {
            assert!(fields.contains(field), "{field}");
        }
    }

    #[test]
    fn test_min_above_max_rejected_before_store_access() {
        let config = CatalogConfig::default();
        // Category 999 does not exist; the price error must win.
        let err = QueryBuilder::new(&config)
            .build(
                &params(&[("min_price", "100"), ("max_price", "50"), ("category", "999")]),
                &categories(),
            )
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("min_price"));
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        let config = CatalogConfig::default();
        let err = QueryBuilder::new(&config)
            .build(&params(&[("category", "999")]), &categories())
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[test]
    fn test_search_is_trimmed() {
        let config = CatalogConfig::default();
        let builder = QueryBuilder::new(&config);
        let plan = builder.parse(&params(&[("search", "  Red  Phone ")])).unwrap();
        assert_eq!(plan.search.as_deref(), Some("Red  Phone"));
        assert_eq!(plan.search_terms(), vec!["red", "phone"]);
        let plan = builder.parse(&params(&[("search", "   ")])).unwrap();
        assert!(plan.search.is_none());
    }

    #[test]
    fn test_booleans() {
        let config = CatalogConfig::default();
        let plan = QueryBuilder::new(&config)
            .build(
                &params(&[("category", "1"), ("include_descendants", "yes"), ("is_active", "0")]),
                &categories(),
            )
            .unwrap();
        assert_eq!(
            plan.category,
            Some(CategoryFilter {
                id: CategoryId::new(1),
                include_descendants: true
            })
        );
        assert!(!plan.active_only);
    }

    #[test]
    fn test_sort_parsing_is_case_insensitive() {
        let config = CatalogConfig::default();
        let plan = QueryBuilder::new(&config)
            .parse(&params(&[("sort", "Price"), ("order", "ASC")]))
            .unwrap();
        assert_eq!(plan.sort, SortField::Price);
        assert_eq!(plan.direction, SortDirection::Asc);
    }

    #[test]
    fn test_to_sql() {
        let config = CatalogConfig::default();
        let plan = QueryPlan::new(&config)
            .with_category(CategoryId::new(1), true)
            .with_price_range(Some(Money::from_units(10)), None)
            .with_search("phone")
            .with_sort(SortField::Price, SortDirection::Asc)
            .with_pagination(2, 10);

        let sql = plan.to_sql(&categories()).unwrap();
        assert!(sql.select.contains("category_id IN (?, ?)"));
        assert!(sql.select.contains("price_cents >= ?"));
        assert!(sql.select.contains("LIKE ?"));
        assert!(sql.select.contains("ORDER BY price_cents ASC, id ASC LIMIT 10 OFFSET 10"));
        assert!(sql.count.starts_with("SELECT COUNT(*)"));
        assert!(sql.params.contains(&SqlParam::Int(1000)));
        assert!(sql.params.contains(&SqlParam::Text("%phone%".to_string())));
    }
}
