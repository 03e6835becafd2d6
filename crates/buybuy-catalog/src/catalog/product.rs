//! Product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::inventory::{PurchaseCheck, StockLevel};
use crate::catalog::media::{ProductImage, ProductSpecification};
use crate::ids::{CategoryId, ProductId, SellerId};
use crate::money::Money;

/// Longest accepted product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// A product listed by a seller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Owning seller.
    pub seller_id: SellerId,
    /// The single category this product is filed under.
    pub category_id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Full description.
    #[serde(default)]
    pub description: String,
    /// Summary for listings.
    #[serde(default)]
    pub short_description: String,
    /// Selling price, always positive.
    pub price: Money,
    /// Original price shown struck through.
    #[serde(default)]
    pub compare_price: Option<Money>,
    /// Units on hand.
    #[serde(default)]
    pub stock_quantity: StockLevel,
    /// Primary image location.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the product is listed.
    /// Gallery in display order.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Attributes sorted by name.
    #[serde(default)]
    pub specifications: Vec<ProductSpecification>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Listed and with at least one unit on hand.
    pub fn is_in_stock(&self) -> bool {
        self.is_active && self.stock_quantity.is_in_stock()
    }

    /// Stock at or below `threshold`.
    pub fn is_low_stock(&self, threshold: u32) -> bool {
        self.stock_quantity.is_low(threshold)
    }

    /// Check whether `quantity` units can be bought right now.
    pub fn can_purchase(&self, quantity: u32) -> PurchaseCheck {
        if !self.is_active {
            PurchaseCheck::Unavailable
        } else if quantity == 0 {
            PurchaseCheck::InvalidQuantity
        } else if !self.stock_quantity.can_fulfill(quantity) {
            PurchaseCheck::InsufficientStock {
                available: self.stock_quantity.quantity(),
            }
        } else {
            PurchaseCheck::Available
        }
    }

    /// Check if the compare price is above the selling price.
    pub fn is_on_sale(&self) -> bool {
        self.compare_price.is_some_and(|cap| cap > self.price)
    }

    /// Discount against the compare price, as a percentage.
    pub fn discount_percentage(&self) -> Option<f64> {
        self.compare_price
            .and_then(|cap| self.price.discount_percentage(cap))
    }

    /// The gallery image flagged primary, if any.
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().find(|image| image.is_primary)
    }

    /// Look up a specification by exact name.
    pub fn specification(&self, name: &str) -> Option<&ProductSpecification> {
        self.specifications.iter().find(|spec| spec.name == name)
    }

    /// Check that every lowercase term occurs in the name or description.
    pub fn matches_terms(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();
        terms
            .iter()
            .all(|term| name.contains(term.as_str()) || description.contains(term.as_str()))
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub compare_price: Option<Money>,
    #[serde(default)]
    pub stock_quantity: u32,
    pub category_id: CategoryId,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewProduct {
    /// Create an active product input with no stock.
    pub fn new(name: impl Into<String>, price: Money, category_id: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            short_description: None,
            price,
            compare_price: None,
            stock_quantity: 0,
            category_id,
            image_url: None,
            is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stock(mut self, quantity: u32) -> Self {
        self.stock_quantity = quantity;
        self
    }

    pub fn with_compare_price(mut self, compare_price: Money) -> Self {
        self.compare_price = Some(compare_price);
        self
    }

    /// Create the product unlisted.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial update of a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<Money>,
    /// `Some(None)` clears the compare price.
    pub compare_price: Option<Option<Money>>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Check whether the update changes anything.
    pub fn is_empty(&self) -> bool {
        self == &ProductUpdate::default()
    }
}

/// Ownership check for product writes.
pub trait SellerGate {
    /// Seller new products are attributed to.
    fn seller(&self) -> SellerId;

    /// Whether the caller may modify `product`.
    fn can_modify(&self, product: &Product) -> bool {
        product.seller_id == self.seller()
    }
}

impl SellerGate for SellerId {
    fn seller(&self) -> SellerId {
        *self
    }
}

/// Staff access: may modify any product, creates on behalf of a seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffGate(pub SellerId);

impl SellerGate for StaffGate {
    fn seller(&self) -> SellerId {
        self.0
    }

    fn can_modify(&self, _product: &Product) -> bool {
        true
    }
}

/// Listing summary derived from a description.
///
/// Descriptions longer than `limit` characters are cut to `limit - 3`
/// characters followed by `...`.
pub fn short_description_for(description: &str, limit: usize) -> String {
    if description.chars().count() > limit {
        let kept: String = description.chars().take(limit.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        description.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            seller_id: SellerId::new(7),
            category_id: CategoryId::new(2),
            name: "Pixel 8".to_string(),
            slug: "pixel-8".to_string(),
            description: "Android phone with a great camera".to_string(),
            short_description: String::new(),
            price: Money::from_units(699),
            compare_price: Some(Money::from_units(799)),
            stock_quantity: StockLevel::new(4),
            image_url: None,
            images: Vec::new(),
            specifications: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_purchase() {
        let mut p = product();
        assert!(p.can_purchase(4).is_allowed());
        assert_eq!(
            p.can_purchase(5),
            PurchaseCheck::InsufficientStock { available: 4 }
        );
        assert_eq!(p.can_purchase(0), PurchaseCheck::InvalidQuantity);
        p.is_active = false;
        assert_eq!(p.can_purchase(1), PurchaseCheck::Unavailable);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_matches_terms_requires_every_term() {
        let p = product();
        assert!(p.matches_terms(&["pixel".to_string()]));
        assert!(p.matches_terms(&["android".to_string(), "camera".to_string()]));
        assert!(!p.matches_terms(&["pixel".to_string(), "iphone".to_string()]));
        assert!(p.matches_terms(&[]));
    }

    #[test]
    fn test_primary_image_needs_flag() {
        let mut p = product();
        let image = ProductImage {
            id: crate::ids::ImageId::new(1),
            image_url: "/media/pixel.jpg".to_string(),
            alt_text: String::new(),
            is_primary: false,
            sort_order: 0,
            created_at: Utc::now(),
        };
        p.images.push(image);
        assert!(p.primary_image().is_none());
        p.images[0].is_primary = true;
        assert_eq!(p.primary_image().map(|i| i.image_url.as_str()), Some("/media/pixel.jpg"));
    }

    #[test]
    fn test_sale_pricing() {
        let p = product();
        assert!(p.is_on_sale());
        let pct = p.discount_percentage().unwrap();
        assert!((pct - 12.5).abs() < 0.1);
    }

    #[test]
    fn test_short_description_truncation() {
        let long = "x".repeat(600);
        let short = short_description_for(&long, 500);
        assert_eq!(short.chars().count(), 500);
        assert!(short.ends_with("..."));
        assert_eq!(short_description_for("brief", 500), "brief");
        assert_eq!(short_description_for(&"y".repeat(500), 500).len(), 500);
    }

    #[test]
    fn test_seller_gate() {
        let p = product();
        assert!(SellerId::new(7).can_modify(&p));
        assert!(!SellerId::new(8).can_modify(&p));
        assert!(StaffGate(SellerId::new(1)).can_modify(&p));
    }
}
