//! Money type for representing prices.
//!
//! Uses a cents-based integer representation so that price comparisons,
//! range filters and facet bounds are exact.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A price in the marketplace currency, stored in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    amount_cents: i64,
}

/// Error returned when a decimal string is not a valid price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError(String);

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseMoneyError {}

impl Money {
    /// Create a Money value from cents.
    pub const fn from_cents(amount_cents: i64) -> Self {
        Self { amount_cents }
    }

    /// Create a Money value from whole currency units.
    pub const fn from_units(units: i64) -> Self {
        Self {
            amount_cents: units * 100,
        }
    }

    /// Amount in cents.
    pub const fn cents(&self) -> i64 {
        self.amount_cents
    }

    /// Create a zero amount.
    pub const fn zero() -> Self {
        Self { amount_cents: 0 }
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Format as a display string (e.g., "$999.99").
    pub fn display(&self) -> String {
        if self.is_negative() {
            format!("-${}", Money::from_cents(-self.amount_cents).display_amount())
        } else {
            format!("${}", self.display_amount())
        }
    }

    /// Format without symbol (e.g., "999.99").
    pub fn display_amount(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    /// Savings relative to a compare-at price, as a percentage.
    pub fn discount_percentage(&self, compare_at: Money) -> Option<f64> {
        if compare_at.amount_cents > self.amount_cents && compare_at.amount_cents > 0 {
            let savings = compare_at.amount_cents - self.amount_cents;
            Some((savings as f64 / compare_at.amount_cents as f64) * 100.0)
        } else {
            None
        }
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parse a decimal string with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(ParseMoneyError(format!("'{}' is not a valid decimal amount", s)));
        }
        if frac.len() > 2 {
            return Err(ParseMoneyError(format!(
                "'{}' has more than 2 decimal places",
                s
            )));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| ParseMoneyError(format!("'{}' is out of range", s)))?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| ParseMoneyError(format!("'{}' is out of range", s)))?;

        Ok(Money::from_cents(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_amount())
    }
}

// Prices travel as decimal strings ("999.99"), like the API's Decimal fields.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display_amount())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a decimal amount as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money::from_cents)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom("amount out of range"))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Ok(Money::from_cents((v * 100.0).round() as i64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
