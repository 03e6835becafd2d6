//! Newtype IDs for type-safe identifiers.
//!
//! Ids are assigned by the store in insertion order, matching the
//! auto-increment keys of the relational tables they mirror.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an ID from its raw value.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// The id following this one; `None` once the id space is used up.
            pub fn next(self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }
    };
}

define_id!(CategoryId);
define_id!(ProductId);
define_id!(SellerId);
define_id!(ImageId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = CategoryId::new(7);
        assert_eq!(id.get(), 7);
        assert_eq!(id.next(), Some(CategoryId::new(8)));
    }

    #[test]
    fn test_next_at_end_of_id_space() {
        assert_eq!(ProductId::new(u64::MAX).next(), None);
        assert_eq!(ProductId::new(u64::MAX - 1).next(), Some(ProductId::new(u64::MAX)));
    }

    #[test]
    fn test_id_parse() {
        let id: ProductId = " 12 ".parse().unwrap();
        assert_eq!(id, ProductId::new(12));
        assert!("abc".parse::<ProductId>().is_err());
        assert!("-1".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", SellerId::new(3)), "3");
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&CategoryId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: CategoryId = serde_json::from_str("5").unwrap();
        assert_eq!(back, CategoryId::new(5));
    }
}
