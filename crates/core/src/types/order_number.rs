//! Human-facing order numbers.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used for generated order numbers.
///
/// Excludes `0`, `1`, `I` and `O`, which are easy to misread over the phone.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Order numbers are exactly [`OrderNumber::LENGTH`] characters.
    #[error("order number must be {} characters", OrderNumber::LENGTH)]
    WrongLength,
    /// Only uppercase letters and digits are allowed.
    #[error("order number may only contain A-Z and 0-9")]
    InvalidCharacter,
}

/// The 8 character identifier printed on invoices and emails.
///
/// Unique across all orders (enforced by the database). Distinct from the
/// internal [`OrderId`](crate::OrderId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Length of every order number.
    pub const LENGTH: usize = 8;

    /// Generate a fresh random order number.
    ///
    /// Uniqueness is not guaranteed here; callers retry on a unique violation.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let number = (0..Self::LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..ALPHABET.len());
                char::from(ALPHABET.get(idx).copied().unwrap_or(b'X'))
            })
            .collect();
        Self(number)
    }

    /// Parse an order number, accepting lowercase input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not 8 ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim().to_ascii_uppercase();
        if s.len() != Self::LENGTH {
            return Err(OrderNumberError::WrongLength);
        }
        if !s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidCharacter);
        }
        Ok(Self(s))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_parseable() {
        for _ in 0..100 {
            let number = OrderNumber::generate();
            assert_eq!(number.as_str().len(), OrderNumber::LENGTH);
            assert_eq!(OrderNumber::parse(number.as_str()).unwrap(), number);
        }
    }

    #[test]
    fn test_generate_avoids_ambiguous_characters() {
        let number = OrderNumber::generate();
        assert!(!number.as_str().contains(['0', '1', 'I', 'O']));
    }

    #[test]
    fn test_parse_uppercases() {
        assert_eq!(OrderNumber::parse("ab12cd34").unwrap().as_str(), "AB12CD34");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            OrderNumber::parse("ABC"),
            Err(OrderNumberError::WrongLength)
        );
        assert_eq!(
            OrderNumber::parse("AB-2CD34"),
            Err(OrderNumberError::InvalidCharacter)
        );
    }
}
