//! Product catalog module.
//!
//! Contains the category tree, products, their galleries and
//! specifications, and stock tracking.

mod category;
mod inventory;
mod media;
mod product;
mod products;
mod tree;

pub use category::{Breadcrumb, Category, CategoryNode, NewCategory, MAX_NAME_LEN, MAX_SORT_ORDER};
pub use inventory::{PurchaseCheck, StockLevel};
pub use media::{
    NewProductImage, ProductImage, ProductSpecification, MAX_ALT_TEXT_LEN, MAX_SPEC_NAME_LEN,
    MAX_SPEC_VALUE_LEN,
};
pub use product::{
    short_description_for, NewProduct, Product, ProductUpdate, SellerGate, StaffGate,
    MAX_PRODUCT_NAME_LEN,
};
pub use products::ProductStore;
pub use tree::CategoryStore;
