//! Stock tracking for products.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// On-hand quantity for a product. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(u32);

impl StockLevel {
    /// Create a stock level.
    pub const fn new(quantity: u32) -> Self {
        Self(quantity)
    }

    /// Units on hand.
    pub const fn quantity(self) -> u32 {
        self.0
    }

    /// Check if any unit is on hand.
    pub fn is_in_stock(self) -> bool {
        self.0 > 0
    }

    /// Check if stock is at or below the threshold.
    pub fn is_low(self, threshold: u32) -> bool {
        self.0 <= threshold
    }

    /// Check if a specific quantity can be taken.
    pub fn can_fulfill(self, quantity: u32) -> bool {
        self.0 >= quantity
    }

    /// Apply a signed change, returning the new level.
    ///
    /// A change that would take the level below zero is rejected and leaves
    /// the level untouched.
    pub fn adjust(&mut self, delta: i64) -> CatalogResult<StockLevel> {
        let next = i64::from(self.0) + delta;
        if next < 0 {
            return Err(CatalogError::invalid(
                "stock_quantity",
                format!(
                    "cannot reduce stock by {}; current stock: {}",
                    delta.unsigned_abs(),
                    self.0
                ),
            ));
        }
        let next = u32::try_from(next).map_err(|_| {
            CatalogError::invalid("stock_quantity", format!("must be at most {}", u32::MAX))
        })?;
        self.0 = next;
        Ok(*self)
    }

    /// Take `quantity` units if they are available.
    pub fn take(&mut self, quantity: u32) -> bool {
        if !self.can_fulfill(quantity) {
            return false;
        }
        self.0 -= quantity;
        true
    }
}

impl From<u32> for StockLevel {
    fn from(quantity: u32) -> Self {
        Self(quantity)
    }
}

/// Outcome of a purchase check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurchaseCheck {
    /// The quantity can be bought.
    Available,
    /// The product is deactivated.
    Unavailable,
    /// A zero quantity was requested.
    InvalidQuantity,
    /// Not enough units on hand.
    InsufficientStock { available: u32 },
}

impl PurchaseCheck {
    /// Whether the purchase may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, PurchaseCheck::Available)
    }

    /// Customer-facing reason; empty when allowed.
    pub fn reason(&self) -> String {
        match self {
            PurchaseCheck::Available => String::new(),
            PurchaseCheck::Unavailable => "Product is not available".to_string(),
            PurchaseCheck::InvalidQuantity => "Quantity must be positive".to_string(),
            PurchaseCheck::InsufficientStock { available } => {
                format!("Insufficient stock (available: {})", available)
            }
        }
    }
}
