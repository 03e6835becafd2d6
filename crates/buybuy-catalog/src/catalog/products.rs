//! Product records keyed by id.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::inventory::StockLevel;
use crate::catalog::media::{self, NewProductImage, ProductImage, ProductSpecification};
use crate::catalog::product::{
    short_description_for, NewProduct, Product, ProductUpdate, SellerGate, MAX_PRODUCT_NAME_LEN,
};
use crate::catalog::tree::CategoryStore;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult, FieldErrors};
use crate::ids::{CategoryId, ImageId, ProductId};
use crate::money::Money;
use crate::slug::slugify;

/// All products in the catalog.
#[derive(Debug, Clone)]
pub struct ProductStore {
    products: BTreeMap<ProductId, Product>,
    slugs: HashMap<String, ProductId>,
    next_id: ProductId,
    next_image_id: ImageId,
    short_description_limit: usize,
}

impl ProductStore {
    /// Create an empty store.
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            products: BTreeMap::new(),
            slugs: HashMap::new(),
            next_id: ProductId::new(1),
            next_image_id: ImageId::new(1),
            short_description_limit: config.short_description_limit,
        }
    }

    /// Rebuild a store from persisted products.
    ///
    /// Every product must reference a category known to `categories` and
    /// pass the same name and pricing rules as `create`.
    pub fn from_products(
        config: &CatalogConfig,
        products: Vec<Product>,
        categories: &CategoryStore,
    ) -> CatalogResult<Self> {
        let mut store = Self::new(config);
        let mut image_ids = HashSet::new();

        for mut product in products {
            if store.products.contains_key(&product.id) {
                return Err(CatalogError::Snapshot(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if !categories.contains(product.category_id) {
                return Err(CatalogError::Snapshot(format!(
                    "product {} references missing category {}",
                    product.id, product.category_id
                )));
            }
            let mut errors = FieldErrors::new();
            validate_name(&product.name, &mut errors);
            validate_pricing(product.price, product.compare_price, &mut errors);
            if !errors.is_empty() {
                return Err(CatalogError::Snapshot(format!(
                    "product {} is invalid: {}",
                    product.id, errors
                )));
            }
            if let Some(owner) = store.slugs.get(&product.slug) {
                return Err(CatalogError::Snapshot(format!(
                    "slug '{}' is used by products {} and {}",
                    product.slug, owner, product.id
                )));
            }
            if product.id >= store.next_id {
                store.next_id = product.id.next().ok_or_else(|| {
                    CatalogError::Snapshot(format!("product id {} leaves no room for new ids", product.id))
                })?;
            }
            for image in &product.images {
                if !image_ids.insert(image.id) {
                    return Err(CatalogError::Snapshot(format!(
                        "duplicate image id {}",
                        image.id
                    )));
                }
                if image.id >= store.next_image_id {
                    store.next_image_id = image.id.next().ok_or_else(|| {
                        CatalogError::Snapshot(format!("image id {} leaves no room for new ids", image.id))
                    })?;
                }
            }
            if product.images.iter().filter(|i| i.is_primary).count() > 1 {
                return Err(CatalogError::Snapshot(format!(
                    "product {} has more than one primary image",
                    product.id
                )));
            }
            product.specifications.sort_by(|a, b| a.name.cmp(&b.name));
            if let Some(pair) = product
                .specifications
                .windows(2)
                .find(|pair| pair[0].name == pair[1].name)
            {
                return Err(CatalogError::Snapshot(format!(
                    "product {} repeats specification '{}'",
                    product.id, pair[0].name
                )));
            }
            media::sort_gallery(&mut product.images);

            store.slugs.insert(product.slug.clone(), product.id);
            store.products.insert(product.id, product);
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product, failing with `NotFound`.
    pub fn get(&self, id: ProductId) -> CatalogResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))
    }

    /// Look up a product by slug.
    pub fn by_slug(&self, slug: &str) -> Option<&Product> {
        self.slugs.get(slug).and_then(|id| self.products.get(id))
    }

    /// All products in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Owned copy of every product, in id order.
    pub fn to_vec(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    /// Number of products filed directly under a category.
    pub fn count_in(&self, category: CategoryId) -> usize {
        self.products
            .values()
            .filter(|p| p.category_id == category)
            .count()
    }

    /// Direct product counts for every category that has products.
    pub fn counts_by_category(&self) -> HashMap<CategoryId, usize> {
        let mut counts = HashMap::new();
        for product in self.products.values() {
            *counts.entry(product.category_id).or_insert(0) += 1;
        }
        counts
    }

    /// Create a product owned by the gate's seller.
    pub fn create(
        &mut self,
        categories: &CategoryStore,
        gate: &dyn SellerGate,
        input: NewProduct,
    ) -> CatalogResult<Product> {
        let mut errors = FieldErrors::new();
        let name = validate_name(&input.name, &mut errors);
        validate_pricing(input.price, input.compare_price, &mut errors);
        check_category(categories, input.category_id, &mut errors)?;

        if let Err(e) = errors.into_result() {
            debug!(name = %input.name, error = %e, "product rejected");
            return Err(e);
        }
        let Some(name) = name else {
            return Err(CatalogError::invalid("name", "must not be empty"));
        };

        let id = self.next_id;
        self.next_id = id
            .next()
            .ok_or_else(|| CatalogError::Conflict("product ids are exhausted".to_string()))?;
        let now = Utc::now();

        let short_description = match input.short_description {
            Some(short) if !short.trim().is_empty() => short.trim().to_string(),
            _ => short_description_for(&input.description, self.short_description_limit),
        };

        let product = Product {
            id,
            seller_id: gate.seller(),
            category_id: input.category_id,
            slug: self.unique_slug(&name, None),
            name,
            description: input.description,
            short_description,
            price: input.price,
            compare_price: input.compare_price,
            stock_quantity: StockLevel::new(input.stock_quantity),
            image_url: input.image_url,
            images: Vec::new(),
            specifications: Vec::new(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        self.slugs.insert(product.slug.clone(), id);
        self.products.insert(id, product.clone());

        info!(product_id = %id, seller_id = %product.seller_id, category_id = %product.category_id, "product created");
        Ok(product)
    }

    /// Apply a partial update.
    pub fn update(
        &mut self,
        categories: &CategoryStore,
        gate: &dyn SellerGate,
        id: ProductId,
        update: ProductUpdate,
    ) -> CatalogResult<Product> {
        let current = self.get(id)?;
        ensure_owner(gate, current)?;

        let mut errors = FieldErrors::new();
        let name = match update.name.as_deref() {
            Some(raw) => validate_name(raw, &mut errors),
            None => Some(current.name.clone()),
        };
        let price = update.price.unwrap_or(current.price);
        let compare_price = update.compare_price.unwrap_or(current.compare_price);
        validate_pricing(price, compare_price, &mut errors);
        if let Some(category) = update.category_id {
            if category != current.category_id {
                check_category(categories, category, &mut errors)?;
            }
        }
        errors.into_result()?;
        let Some(name) = name else {
            return Err(CatalogError::invalid("name", "must not be empty"));
        };

        let slug = if name != current.name {
            Some(self.unique_slug(&name, Some(id)))
        } else {
            None
        };
        let limit = self.short_description_limit;

        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;

        if let Some(slug) = slug {
            self.slugs.remove(&product.slug);
            self.slugs.insert(slug.clone(), id);
            product.slug = slug;
        }
        product.name = name;
        if let Some(description) = update.description {
            if update.short_description.is_none() {
                product.short_description = short_description_for(&description, limit);
            }
            product.description = description;
        }
        if let Some(short) = update.short_description {
            product.short_description = short.trim().to_string();
        }
        product.price = price;
        product.compare_price = compare_price;
        if let Some(category) = update.category_id {
            product.category_id = category;
        }
        if let Some(image_url) = update.image_url {
            product.image_url = image_url;
        }
        if let Some(active) = update.is_active {
            product.is_active = active;
        }
        product.updated_at = Utc::now();

        info!(product_id = %id, "product updated");
        Ok(product.clone())
    }

    /// Remove a product.
    pub fn delete(&mut self, gate: &dyn SellerGate, id: ProductId) -> CatalogResult<Product> {
        ensure_owner(gate, self.get(id)?)?;
        let removed = self
            .products
            .remove(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        self.slugs.remove(&removed.slug);
        info!(product_id = %id, "product deleted");
        Ok(removed)
    }

    /// Apply a signed stock change; the level never drops below zero.
    pub fn adjust_stock(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        delta: i64,
    ) -> CatalogResult<Product> {
        ensure_owner(gate, self.get(id)?)?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        let level = product.stock_quantity.adjust(delta)?;
        product.updated_at = Utc::now();
        info!(product_id = %id, delta, stock = level.quantity(), "stock adjusted");
        Ok(product.clone())
    }

    /// Take `quantity` units for an order.
    ///
    /// Returns `false` without changing anything when the product cannot be
    /// purchased in that quantity.
    pub fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> CatalogResult<bool> {
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        let check = product.can_purchase(quantity);
        if !check.is_allowed() {
            debug!(product_id = %id, quantity, reason = %check.reason(), "reservation refused");
            return Ok(false);
        }
        if !product.stock_quantity.take(quantity) {
            return Ok(false);
        }
        product.updated_at = Utc::now();
        Ok(true)
    }

    /// Add an image to a product's gallery.
    ///
    /// A primary image takes the flag from any earlier primary.
    pub fn add_image(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        input: NewProductImage,
    ) -> CatalogResult<ProductImage> {
        ensure_owner(gate, self.get(id)?)?;
        let mut errors = FieldErrors::new();
        let validated = media::validate_image(&input, &mut errors);
        errors.into_result()?;
        let Some((image_url, alt_text)) = validated else {
            return Err(CatalogError::invalid("image_url", "must not be empty"));
        };

        let image_id = self.next_image_id;
        let next = image_id
            .next()
            .ok_or_else(|| CatalogError::Conflict("image ids are exhausted".to_string()))?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        self.next_image_id = next;

        let now = Utc::now();
        let image = ProductImage {
            id: image_id,
            image_url,
            alt_text,
            is_primary: false,
            sort_order: input.sort_order,
            created_at: now,
        };
        product.images.push(image.clone());
        if input.is_primary {
            media::set_primary(&mut product.images, image_id);
        }
        media::sort_gallery(&mut product.images);
        product.updated_at = now;

        info!(product_id = %id, image_id = %image_id, primary = input.is_primary, "image added");
        Ok(ProductImage {
            is_primary: input.is_primary,
            ..image
        })
    }

    /// Make one gallery image the product's only primary image.
    pub fn set_primary_image(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        image_id: ImageId,
    ) -> CatalogResult<Product> {
        ensure_owner(gate, self.get(id)?)?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        if !media::set_primary(&mut product.images, image_id) {
            return Err(image_not_found(image_id));
        }
        product.updated_at = Utc::now();
        info!(product_id = %id, image_id = %image_id, "primary image set");
        Ok(product.clone())
    }

    /// Drop an image from a product's gallery.
    pub fn remove_image(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        image_id: ImageId,
    ) -> CatalogResult<ProductImage> {
        ensure_owner(gate, self.get(id)?)?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        let Some(index) = product.images.iter().position(|i| i.id == image_id) else {
            return Err(image_not_found(image_id));
        };
        let removed = product.images.remove(index);
        product.updated_at = Utc::now();
        info!(product_id = %id, image_id = %image_id, "image removed");
        Ok(removed)
    }

    /// Add a named attribute. Names are unique per product.
    pub fn add_specification(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        name: &str,
        value: &str,
    ) -> CatalogResult<ProductSpecification> {
        let current = self.get(id)?;
        ensure_owner(gate, current)?;
        let mut errors = FieldErrors::new();
        let validated = media::validate_specification(name, value, &mut errors);
        if let Some((name, _)) = &validated {
            if current.specification(name).is_some() {
                errors.add("name", format!("specification '{}' already exists", name));
            }
        }
        errors.into_result()?;
        let Some((name, value)) = validated else {
            return Err(CatalogError::invalid("name", "must not be empty"));
        };

        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        let now = Utc::now();
        let spec = ProductSpecification {
            name,
            value,
            created_at: now,
        };
        let at = product
            .specifications
            .partition_point(|existing| existing.name < spec.name);
        product.specifications.insert(at, spec.clone());
        product.updated_at = now;

        debug!(product_id = %id, specification = %spec, "specification added");
        Ok(spec)
    }

    /// Remove a named attribute.
    pub fn remove_specification(
        &mut self,
        gate: &dyn SellerGate,
        id: ProductId,
        name: &str,
    ) -> CatalogResult<ProductSpecification> {
        ensure_owner(gate, self.get(id)?)?;
        let product = self
            .products
            .get_mut(&id)
            .ok_or_else(|| CatalogError::product_not_found(id))?;
        let Some(index) = product.specifications.iter().position(|s| s.name == name) else {
            return Err(CatalogError::NotFound {
                entity: "Specification",
                id: name.to_string(),
            });
        };
        let removed = product.specifications.remove(index);
        product.updated_at = Utc::now();
        Ok(removed)
    }

    fn unique_slug(&self, name: &str, owner: Option<ProductId>) -> String {
        let mut base = slugify(name);
        if base.is_empty() {
            base = "product".to_string();
        }
        let taken = |slug: &str| {
            self.slugs
                .get(slug)
                .is_some_and(|existing| Some(*existing) != owner)
        };
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn ensure_owner(gate: &dyn SellerGate, product: &Product) -> CatalogResult<()> {
    if gate.can_modify(product) {
        Ok(())
    } else {
        Err(CatalogError::Forbidden(format!(
            "seller {} does not own product {}",
            gate.seller(),
            product.id
        )))
    }
}

fn image_not_found(id: ImageId) -> CatalogError {
    CatalogError::NotFound {
        entity: "Image",
        id: id.to_string(),
    }
}

fn validate_name(name: &str, errors: &mut FieldErrors) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        errors.add("name", "must not be empty");
        return None;
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        errors.add(
            "name",
            format!("must be at most {} characters", MAX_PRODUCT_NAME_LEN),
        );
        return None;
    }
    Some(name.to_string())
}

fn validate_pricing(price: Money, compare_price: Option<Money>, errors: &mut FieldErrors) {
    if !price.is_positive() {
        errors.add("price", "must be greater than 0");
    }
    if let Some(compare) = compare_price {
        if compare < price {
            errors.add("compare_price", "must not be lower than price");
        }
    }
}

fn check_category(
    categories: &CategoryStore,
    id: CategoryId,
    errors: &mut FieldErrors,
) -> CatalogResult<()> {
    if !categories.contains(id) {
        errors.add("category_id", format!("category {} does not exist", id));
    } else if !categories.is_visible(id)? {
        errors.add("category_id", "category must be active");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::category::NewCategory;
    use crate::ids::SellerId;

    fn setup() -> (CategoryStore, ProductStore) {
        let config = CatalogConfig::default();
        let mut categories = CategoryStore::new(&config);
        let root = categories.create(NewCategory::new("Electronics")).unwrap();
        categories
            .create(NewCategory::new("Smartphones").with_parent(root.id))
            .unwrap();
        (categories, ProductStore::new(&config))
    }

    const SELLER: SellerId = SellerId::new(10);

    #[test]
    fn test_create_product() {
        let (categories, mut products) = setup();
        let p = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("iPhone 15", Money::from_units(999), CategoryId::new(2))
                    .with_stock(5),
            )
            .unwrap();
        assert_eq!(p.id, ProductId::new(1));
        assert_eq!(p.slug, "iphone-15");
        assert_eq!(p.seller_id, SELLER);
        assert_eq!(products.count_in(CategoryId::new(2)), 1);
    }

    #[test]
    fn test_create_collects_field_errors() {
        let (categories, mut products) = setup();
        let input = NewProduct::new("", Money::zero(), CategoryId::new(99))
            .with_compare_price(Money::from_cents(-1));
        let err = products.create(&categories, &SELLER, input).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("name"));
        assert!(fields.contains("price"));
        assert!(fields.contains("category_id"));
        assert!(products.is_empty());
    }

    #[test]
    fn test_create_rejects_hidden_category() {
        let (mut categories, mut products) = setup();
        categories.set_active(CategoryId::new(1), false).unwrap();
        let err = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("Pixel", Money::from_units(599), CategoryId::new(2)),
            )
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("category_id"));
    }

    #[test]
    fn test_duplicate_names_get_suffixed_slugs() {
        let (categories, mut products) = setup();
        let input = NewProduct::new("Case", Money::from_units(10), CategoryId::new(2));
        let a = products.create(&categories, &SELLER, input.clone()).unwrap();
        let b = products.create(&categories, &SELLER, input).unwrap();
        assert_eq!(a.slug, "case");
        assert_eq!(b.slug, "case-2");
    }

    #[test]
    fn test_update_requires_owner() {
        let (categories, mut products) = setup();
        let p = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("Charger", Money::from_units(20), CategoryId::new(2)),
            )
            .unwrap();
        let update = ProductUpdate {
            price: Some(Money::from_units(25)),
            ..ProductUpdate::default()
        };
        let err = products
            .update(&categories, &SellerId::new(11), p.id, update.clone())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));

        let updated = products.update(&categories, &SELLER, p.id, update).unwrap();
        assert_eq!(updated.price, Money::from_units(25));
    }

    #[test]
    fn test_update_description_refreshes_summary() {
        let (categories, mut products) = setup();
        let p = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("Cable", Money::from_units(5), CategoryId::new(2))
                    .with_description("short"),
            )
            .unwrap();
        assert_eq!(p.short_description, "short");
        let update = ProductUpdate {
            description: Some("z".repeat(501)),
            ..ProductUpdate::default()
        };
        let updated = products.update(&categories, &SELLER, p.id, update).unwrap();
        assert_eq!(updated.short_description.chars().count(), 500);
    }

    #[test]
    fn test_stock_operations() {
        let (categories, mut products) = setup();
        let p = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("Earbuds", Money::from_units(99), CategoryId::new(2))
                    .with_stock(3),
            )
            .unwrap();

        assert!(products.adjust_stock(&SELLER, p.id, -4).is_err());
        assert_eq!(products.get(p.id).unwrap().stock_quantity.quantity(), 3);

        assert!(products.reserve_stock(p.id, 2).unwrap());
        assert!(!products.reserve_stock(p.id, 2).unwrap());
        assert_eq!(products.get(p.id).unwrap().stock_quantity.quantity(), 1);

        let p = products.adjust_stock(&SELLER, p.id, 9).unwrap();
        assert_eq!(p.stock_quantity.quantity(), 10);
        assert!(p.is_low_stock(10));
    }

    #[test]
    fn test_delete_product() {
        let (categories, mut products) = setup();
        let p = products
            .create(
                &categories,
                &SELLER,
                NewProduct::new("Stand", Money::from_units(15), CategoryId::new(2)),
            )
            .unwrap();
        assert!(products.delete(&SellerId::new(3), p.id).is_err());
        products.delete(&SELLER, p.id).unwrap();
        assert!(products.by_slug("stand").is_none());
        assert!(matches!(
            products.get(p.id),
            Err(CatalogError::NotFound { .. })
        ));
    }

    fn phone(categories: &CategoryStore, products: &mut ProductStore) -> Product {
        products
            .create(
                categories,
                &SELLER,
                NewProduct::new("Pixel 8", Money::from_units(699), CategoryId::new(2)),
            )
            .unwrap()
    }

    #[test]
    fn test_gallery_keeps_one_primary() {
        let (categories, mut products) = setup();
        let p = phone(&categories, &mut products);

        let front = products
            .add_image(&SELLER, p.id, NewProductImage::new("/media/front.jpg").primary())
            .unwrap();
        let back = products
            .add_image(
                &SELLER,
                p.id,
                NewProductImage::new("/media/back.jpg").with_sort_order(2),
            )
            .unwrap();
        let side = products
            .add_image(
                &SELLER,
                p.id,
                NewProductImage::new("/media/side.jpg")
                    .with_sort_order(1)
                    .primary(),
            )
            .unwrap();
        assert!(side.is_primary);

        let stored = products.get(p.id).unwrap();
        let order: Vec<ImageId> = stored.images.iter().map(|i| i.id).collect();
        assert_eq!(order, vec![front.id, side.id, back.id]);
        assert_eq!(stored.primary_image().map(|i| i.id), Some(side.id));

        let updated = products.set_primary_image(&SELLER, p.id, back.id).unwrap();
        assert_eq!(updated.images.iter().filter(|i| i.is_primary).count(), 1);
        assert_eq!(updated.primary_image().map(|i| i.id), Some(back.id));

        let err = products
            .set_primary_image(&SELLER, p.id, ImageId::new(99))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "Image", .. }));

        products.remove_image(&SELLER, p.id, back.id).unwrap();
        assert!(products.get(p.id).unwrap().primary_image().is_none());
    }

    #[test]
    fn test_gallery_requires_owner_and_url() {
        let (categories, mut products) = setup();
        let p = phone(&categories, &mut products);
        let err = products
            .add_image(&SellerId::new(11), p.id, NewProductImage::new("/media/a.jpg"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));

        let err = products
            .add_image(&SELLER, p.id, NewProductImage::new(" "))
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("image_url"));
        assert!(products.get(p.id).unwrap().images.is_empty());
    }

    #[test]
    fn test_specifications_unique_and_sorted() {
        let (categories, mut products) = setup();
        let p = phone(&categories, &mut products);

        products
            .add_specification(&SELLER, p.id, "Screen Size", "6.2 inches")
            .unwrap();
        products
            .add_specification(&SELLER, p.id, "Color", "Obsidian")
            .unwrap();
        let err = products
            .add_specification(&SELLER, p.id, " Color ", "Hazel")
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("name"));

        let stored = products.get(p.id).unwrap();
        let labels: Vec<String> = stored
            .specifications
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(labels, vec!["Color: Obsidian", "Screen Size: 6.2 inches"]);

        products
            .remove_specification(&SELLER, p.id, "Color")
            .unwrap();
        assert!(products.get(p.id).unwrap().specification("Color").is_none());
        assert!(products
            .remove_specification(&SELLER, p.id, "Color")
            .is_err());
    }

    #[test]
    fn test_from_products_checks_pricing_and_name() {
        let (categories, mut products) = setup();
        let p = phone(&categories, &mut products);
        let config = CatalogConfig::default();

        let mut cheap_compare = p.clone();
        cheap_compare.compare_price = Some(Money::from_units(10));
        let err = ProductStore::from_products(&config, vec![cheap_compare], &categories)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Snapshot(ref m) if m.contains("compare_price")));

        let mut blank = p.clone();
        blank.name = "   ".to_string();
        let err = ProductStore::from_products(&config, vec![blank], &categories).unwrap_err();
        assert!(matches!(err, CatalogError::Snapshot(ref m) if m.contains("name")));

        let mut long = p;
        long.name = "x".repeat(MAX_PRODUCT_NAME_LEN + 1);
        assert!(ProductStore::from_products(&config, vec![long], &categories).is_err());
    }

    #[test]
    fn test_from_products_checks_gallery() {
        let (categories, mut products) = setup();
        let p = phone(&categories, &mut products);
        products
            .add_image(&SELLER, p.id, NewProductImage::new("/media/a.jpg").primary())
            .unwrap();
        products
            .add_image(&SELLER, p.id, NewProductImage::new("/media/b.jpg"))
            .unwrap();
        let config = CatalogConfig::default();

        let mut reloaded =
            ProductStore::from_products(&config, products.to_vec(), &categories).unwrap();
        let image = reloaded
            .add_image(&SELLER, p.id, NewProductImage::new("/media/c.jpg"))
            .unwrap();
        assert_eq!(image.id, ImageId::new(3));

        let mut two_primary = products.get(p.id).unwrap().clone();
        two_primary.images[1].is_primary = true;
        assert!(ProductStore::from_products(&config, vec![two_primary], &categories).is_err());
    }
}
