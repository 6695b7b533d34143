//! Rupee amounts using decimal arithmetic.
//!
//! Every amount the dashboard handles (order totals, list and sale prices)
//! is in Indian rupees, so `Price` carries no currency code. Display uses
//! the Indian digit grouping (`₹12,34,567`).

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors from parsing a price typed into a form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("price must be a number")]
    NotANumber,
    #[error("price cannot be negative")]
    Negative,
}

/// An amount in rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a non-negative amount from form input (`"1999"`, `"1,999.50"`).
    ///
    /// # Errors
    ///
    /// Returns `PriceError` for blank, non-numeric, or negative input.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount: Decimal = cleaned.parse().map_err(|_| PriceError::NotANumber)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Lossy conversion used for numeric sorting.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Formats as `₹1,23,456` (whole rupees) or `₹1,23,456.50`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();
        let whole = abs.trunc();
        let paise = ((abs - whole) * Decimal::ONE_HUNDRED)
            .trunc()
            .to_u32()
            .unwrap_or(0);

        let grouped = group_indian(&whole.to_string());
        if negative {
            f.write_str("-")?;
        }
        if paise == 0 {
            write!(f, "₹{grouped}")
        } else {
            write!(f, "₹{grouped}.{paise:02}")
        }
    }
}

/// Insert Indian-style separators: the last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap())
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(price("0").to_string(), "₹0");
        assert_eq!(price("999").to_string(), "₹999");
        assert_eq!(price("6990").to_string(), "₹6,990");
        assert_eq!(price("854492").to_string(), "₹8,54,492");
        assert_eq!(price("12398765").to_string(), "₹1,23,98,765");
    }

    #[test]
    fn test_display_paise() {
        assert_eq!(price("1999.5").to_string(), "₹1,999.50");
        assert_eq!(price("10.005").to_string(), "₹10.01");
        assert_eq!(price("-250.25").to_string(), "-₹250.25");
    }

    #[test]
    fn test_parse_form_input() {
        assert_eq!(Price::parse(" 1,999.50 ").unwrap(), price("1999.50"));
        assert_eq!(Price::parse("₹250").unwrap(), price("250"));
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_sum() {
        let total: Price = [price("100.50"), price("99.50"), price("800")].iter().sum();
        assert_eq!(total, price("1000"));
    }

    #[test]
    fn test_deserializes_backend_numbers() {
        let from_number: Price = serde_json::from_str("1499.99").unwrap();
        let from_string: Price = serde_json::from_str("\"1499.99\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}
