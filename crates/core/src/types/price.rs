//! Fixed-point money amounts.
//!
//! Prices are stored as `NUMERIC(10, 2)` and handled as [`Decimal`] so that
//! line totals and order totals never pick up floating point error. All
//! amounts are in rupees; the store does not sell in other currencies.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with two decimal places.
///
/// Serialized as a string (`"30.00"`) to keep precision across JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount, rounded to two places.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut amount = amount.round_dp(2);
        amount.rescale(2);
        Self(amount)
    }

    /// Create a price from an amount in paise (1/100 rupee).
    #[must_use]
    pub fn from_paise(paise: i64) -> Self {
        Self(Decimal::new(paise, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: i32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 + rhs.0)
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

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_multiplies_by_quantity() {
        let unit = Price::from_paise(1000);
        assert_eq!(unit.times(3), Price::from_paise(3000));
    }

    #[test]
    fn test_sum_of_prices() {
        let total: Price = [Price::from_paise(1999), Price::from_paise(1)]
            .iter()
            .sum();
        assert_eq!(total, Price::from_paise(2000));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Price = std::iter::empty::<Price>().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_paise(3000).to_string(), "30.00");
        assert_eq!(Price::new(Decimal::new(5, 1)).to_string(), "0.50");
    }

    #[test]
    fn test_new_rounds_to_paise() {
        let price = Price::new(Decimal::new(10_005, 3));
        assert_eq!(price.amount().scale(), 2);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Price::from_paise(1050)).unwrap();
        assert_eq!(json, "\"10.50\"");
        let parsed: Price = serde_json::from_str("\"10.50\"").unwrap();
        assert_eq!(parsed, Price::from_paise(1050));
    }

    #[test]
    fn test_is_negative() {
        assert!(Price::from_paise(-1).is_negative());
        assert!(!Price::ZERO.is_negative());
    }
}
