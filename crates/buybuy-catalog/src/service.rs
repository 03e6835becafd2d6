//! The `Catalog` facade: shared, lock-protected access to the stores.
//!
//! Reads take the read lock; every mutation takes the write lock for the
//! whole validate-then-write sequence, so two concurrent moves cannot
//! interleave into a cycle.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::catalog::{
    Breadcrumb, Category, CategoryNode, CategoryStore, NewCategory, NewProduct, NewProductImage,
    Product, ProductImage, ProductSpecification, ProductStore, ProductUpdate, SellerGate,
};
use crate::config::CatalogConfig;
use crate::error::CatalogResult;
use crate::ids::{CategoryId, ImageId, ProductId};
use crate::search::{CatalogIndex, QueryBuilder, QueryPlan, RawParams, SearchResults, SqlQuery};
use crate::snapshot::CatalogSnapshot;

#[derive(Debug)]
struct CatalogState {
    categories: CategoryStore,
    products: ProductStore,
}

/// Category with its computed tree facts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub full_path: Vec<Breadcrumb>,
    pub full_path_label: String,
    pub depth_level: usize,
    pub is_leaf: bool,
    pub is_visible: bool,
    pub children_count: usize,
    /// Products filed directly under this category.
    pub product_count: usize,
    /// Products in this category and all descendants.
    pub total_product_count: usize,
    pub can_be_deleted: bool,
}

/// Thread-safe catalog handle. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: Arc<CatalogConfig>,
    state: Arc<RwLock<CatalogState>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        config.validate()?;
        let state = CatalogState {
            categories: CategoryStore::new(&config),
            products: ProductStore::new(&config),
        };
        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Load a catalog from a snapshot.
    pub fn from_snapshot(config: CatalogConfig, snapshot: CatalogSnapshot) -> CatalogResult<Self> {
        config.validate()?;
        let (categories, products) = snapshot.into_stores(&config)?;
        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(CatalogState {
                categories,
                products,
            })),
        })
    }

    /// Capture the current state.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read();
        CatalogSnapshot::capture(&state.categories, &state.products)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn category_count(&self) -> usize {
        self.state.read().categories.len()
    }

    pub fn product_count(&self) -> usize {
        self.state.read().products.len()
    }

    // === categories ===

    pub fn create_category(&self, input: NewCategory) -> CatalogResult<Category> {
        self.state.write().categories.create(input)
    }

    pub fn category(&self, id: CategoryId) -> CatalogResult<Category> {
        self.state.read().categories.get(id).cloned()
    }

    pub fn category_by_slug(&self, slug: &str) -> Option<Category> {
        self.state.read().categories.by_slug(slug).cloned()
    }

    /// All categories in id order.
    pub fn categories(&self) -> Vec<Category> {
        self.state.read().categories.to_vec()
    }

    /// Categories in display order; see [`CategoryStore::listing`].
    pub fn list_categories(
        &self,
        parent: Option<Option<CategoryId>>,
        active_only: bool,
    ) -> CatalogResult<Vec<Category>> {
        let state = self.state.read();
        Ok(state
            .categories
            .listing(parent, active_only)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Ancestors from the root down to the immediate parent.
    pub fn ancestors(&self, id: CategoryId) -> CatalogResult<Vec<Category>> {
        let state = self.state.read();
        Ok(state
            .categories
            .ancestors(id)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Descendants in breadth-first order.
    pub fn descendants(&self, id: CategoryId) -> CatalogResult<Vec<Category>> {
        let state = self.state.read();
        state
            .categories
            .descendants(id)?
            .into_iter()
            .map(|d| state.categories.get(d).cloned())
            .collect()
    }

    pub fn full_path(&self, id: CategoryId) -> CatalogResult<Vec<Breadcrumb>> {
        self.state.read().categories.full_path(id)
    }

    /// Path as one `A > B > C` label.
    pub fn full_path_label(&self, id: CategoryId) -> CatalogResult<String> {
        self.state.read().categories.full_path_label(id)
    }

    pub fn children(&self, id: CategoryId) -> CatalogResult<Vec<Category>> {
        let state = self.state.read();
        Ok(state
            .categories
            .children(id)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn roots(&self) -> Vec<Category> {
        self.state
            .read()
            .categories
            .roots()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Nested tree of active categories.
    pub fn tree(&self) -> Vec<CategoryNode> {
        self.state.read().categories.tree()
    }

    /// Category plus path, depth, and product counts.
    pub fn category_detail(&self, id: CategoryId) -> CatalogResult<CategoryDetail> {
        let state = self.state.read();
        let categories = &state.categories;
        let category = categories.get(id)?.clone();

        let product_count = state.products.count_in(id);
        let subtree = categories.subtree(id)?;
        let total_product_count = state
            .products
            .iter()
            .filter(|p| subtree.contains(&p.category_id))
            .count();

        Ok(CategoryDetail {
            full_path: categories.full_path(id)?,
            full_path_label: categories.full_path_label(id)?,
            depth_level: categories.depth(id)?,
            is_leaf: categories.is_leaf(id)?,
            is_visible: categories.is_visible(id)?,
            children_count: categories.children(id)?.len(),
            product_count,
            total_product_count,
            can_be_deleted: product_count == 0,
            category,
        })
    }

    /// Whether `delete_category` would currently succeed.
    pub fn can_delete_category(&self, id: CategoryId) -> CatalogResult<bool> {
        let state = self.state.read();
        state.categories.get(id)?;
        Ok(state.products.count_in(id) == 0)
    }

    pub fn set_category_active(&self, id: CategoryId, active: bool) -> CatalogResult<Category> {
        self.state.write().categories.set_active(id, active)
    }

    pub fn reparent_category(
        &self,
        id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> CatalogResult<Category> {
        self.state.write().categories.reparent(id, new_parent)
    }

    pub fn rename_category(&self, id: CategoryId, name: &str) -> CatalogResult<Category> {
        self.state.write().categories.rename(id, name)
    }

    pub fn set_category_sort_order(&self, id: CategoryId, sort_order: i32) -> CatalogResult<Category> {
        self.state.write().categories.set_sort_order(id, sort_order)
    }

    /// Delete a category; fails with `Conflict` while products reference it.
    pub fn delete_category(&self, id: CategoryId) -> CatalogResult<Category> {
        let mut state = self.state.write();
        let attached = state.products.count_in(id);
        state.categories.delete(id, attached)
    }

    // === listing ===

    /// Validate raw parameters into a plan.
    pub fn build_query(&self, raw: &RawParams) -> CatalogResult<QueryPlan> {
        let state = self.state.read();
        QueryBuilder::new(&self.config).build(raw, &state.categories)
    }

    /// Run a validated plan.
    pub fn list_products(&self, plan: &QueryPlan) -> CatalogResult<SearchResults<Product>> {
        let state = self.state.read();
        CatalogIndex::new(&state.categories, &state.products).list(plan)
    }

    /// Validate and run raw parameters under one read lock.
    pub fn query(&self, raw: &RawParams) -> CatalogResult<SearchResults<Product>> {
        let state = self.state.read();
        let plan = QueryBuilder::new(&self.config).build(raw, &state.categories)?;
        CatalogIndex::new(&state.categories, &state.products).list(&plan)
    }

    /// SQL rendering of a plan.
    pub fn to_sql(&self, plan: &QueryPlan) -> CatalogResult<SqlQuery> {
        plan.to_sql(&self.state.read().categories)
    }

    // === products ===

    pub fn product(&self, id: ProductId) -> CatalogResult<Product> {
        self.state.read().products.get(id).cloned()
    }

    pub fn product_by_slug(&self, slug: &str) -> Option<Product> {
        self.state.read().products.by_slug(slug).cloned()
    }

    pub fn create_product(&self, gate: &dyn SellerGate, input: NewProduct) -> CatalogResult<Product> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.products.create(&state.categories, gate, input)
    }

    pub fn update_product(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        update: ProductUpdate,
    ) -> CatalogResult<Product> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.products.update(&state.categories, gate, id, update)
    }

    pub fn delete_product(&self, gate: &dyn SellerGate, id: ProductId) -> CatalogResult<Product> {
        self.state.write().products.delete(gate, id)
    }

    pub fn adjust_stock(&self, gate: &dyn SellerGate, id: ProductId, delta: i64) -> CatalogResult<Product> {
        self.state.write().products.adjust_stock(gate, id, delta)
    }

    pub fn reserve_stock(&self, id: ProductId, quantity: u32) -> CatalogResult<bool> {
        self.state.write().products.reserve_stock(id, quantity)
    }

    // === gallery and specifications ===

    pub fn add_product_image(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        input: NewProductImage,
    ) -> CatalogResult<ProductImage> {
        self.state.write().products.add_image(gate, id, input)
    }

    pub fn set_primary_image(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        image_id: ImageId,
    ) -> CatalogResult<Product> {
        self.state.write().products.set_primary_image(gate, id, image_id)
    }

    pub fn remove_product_image(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        image_id: ImageId,
    ) -> CatalogResult<ProductImage> {
        self.state.write().products.remove_image(gate, id, image_id)
    }

    pub fn add_specification(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        name: &str,
        value: &str,
    ) -> CatalogResult<ProductSpecification> {
        self.state
            .write()
            .products
            .add_specification(gate, id, name, value)
    }

    pub fn remove_specification(
        &self,
        gate: &dyn SellerGate,
        id: ProductId,
        name: &str,
    ) -> CatalogResult<ProductSpecification> {
        self.state.write().products.remove_specification(gate, id, name)
    }

    /// Stock at or below the configured low-stock threshold.
    pub fn is_low_stock(&self, id: ProductId) -> CatalogResult<bool> {
        let threshold = self.config.low_stock_threshold;
        Ok(self.state.read().products.get(id)?.is_low_stock(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::ids::SellerId;
    use crate::money::Money;
    use std::thread;

    #[test]
    fn test_delete_category_counts_direct_products() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let root = catalog.create_category(NewCategory::new("Home")).unwrap();
        let leaf = catalog
            .create_category(NewCategory::new("Kitchen").with_parent(root.id))
            .unwrap();
        catalog
            .create_product(
                &SellerId::new(1),
                NewProduct::new("Kettle", Money::from_units(30), leaf.id),
            )
            .unwrap();

        assert!(!catalog.can_delete_category(leaf.id).unwrap());
        assert!(matches!(
            catalog.delete_category(leaf.id),
            Err(CatalogError::Conflict(_))
        ));
        // Products below a category do not block it.
        catalog.delete_category(root.id).unwrap();
        assert!(catalog.category(leaf.id).unwrap().is_root());
    }

    #[test]
    fn test_category_detail_counts() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let root = catalog.create_category(NewCategory::new("Home")).unwrap();
        let leaf = catalog
            .create_category(NewCategory::new("Kitchen").with_parent(root.id))
            .unwrap();
        for name in ["Kettle", "Toaster"] {
            catalog
                .create_product(&SellerId::new(1), NewProduct::new(name, Money::from_units(30), leaf.id))
                .unwrap();
        }

        let detail = catalog.category_detail(root.id).unwrap();
        assert_eq!(detail.product_count, 0);
        assert_eq!(detail.total_product_count, 2);
        assert_eq!(detail.children_count, 1);
        assert!(detail.can_be_deleted);

        let detail = catalog.category_detail(leaf.id).unwrap();
        assert_eq!(detail.full_path_label, "Home > Kitchen");
        assert_eq!(detail.depth_level, 1);
        assert!(detail.is_leaf);
    }

    #[test]
    fn test_concurrent_moves_never_form_cycle() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let a = catalog.create_category(NewCategory::new("A")).unwrap();
        let b = catalog.create_category(NewCategory::new("B")).unwrap();

        let c1 = catalog.clone();
        let c2 = catalog.clone();
        let t1 = thread::spawn(move || c1.reparent_category(a.id, Some(b.id)).is_ok());
        let t2 = thread::spawn(move || c2.reparent_category(b.id, Some(a.id)).is_ok());
        let ok1 = t1.join().unwrap();
        let ok2 = t2.join().unwrap();

        assert!(ok1 ^ ok2, "exactly one move must win");
        // Both categories still resolve a finite path.
        assert!(catalog.full_path(a.id).is_ok());
        assert!(catalog.full_path(b.id).is_ok());
    }

    #[test]
    fn test_snapshot_round_trip_keeps_listing() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let root = catalog.create_category(NewCategory::new("Books")).unwrap();
        catalog
            .create_product(&SellerId::new(1), NewProduct::new("Dune", Money::from_units(12), root.id))
            .unwrap();

        let json = catalog.snapshot().to_json().unwrap();
        let restored = Catalog::from_snapshot(
            CatalogConfig::default(),
            CatalogSnapshot::from_json(&json).unwrap(),
        )
        .unwrap();
        let results = restored.query(&RawParams::new()).unwrap();
        assert_eq!(results.items[0].name, "Dune");
    }

    #[test]
    fn test_snapshot_keeps_gallery_and_specifications() {
        let catalog = Catalog::new(CatalogConfig::default()).unwrap();
        let seller = SellerId::new(1);
        let root = catalog.create_category(NewCategory::new("Books")).unwrap();
        let book = catalog
            .create_product(&seller, NewProduct::new("Dune", Money::from_units(12), root.id))
            .unwrap();
        let cover = catalog
            .add_product_image(
                &seller,
                book.id,
                NewProductImage::new("/media/dune.jpg").primary(),
            )
            .unwrap();
        catalog
            .add_specification(&seller, book.id, "Pages", "412")
            .unwrap();

        let json = catalog.snapshot().to_json().unwrap();
        let restored = Catalog::from_snapshot(
            CatalogConfig::default(),
            CatalogSnapshot::from_json(&json).unwrap(),
        )
        .unwrap();
        let product = restored.product(book.id).unwrap();
        assert_eq!(product.primary_image().map(|i| i.id), Some(cover.id));
        assert_eq!(product.specification("Pages").map(|s| s.value.as_str()), Some("412"));
    }
}
