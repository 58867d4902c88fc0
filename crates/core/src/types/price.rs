//! Catalog price representation using decimal arithmetic.
//!
//! Amounts are in the store currency's standard unit (dollars, not cents) and
//! are stored as `NUMERIC(10,2)`. Floating point never touches money.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price must be greater than 0")]
    NotPositive,
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
}

/// A strictly positive catalog price with cent precision.
///
/// ```
/// use bazaar_core::Price;
/// use rust_decimal::Decimal;
///
/// assert!(Price::new(Decimal::new(1999, 2)).is_ok());
/// assert!(Price::new(Decimal::ZERO).is_err());
/// assert!(Price::new(Decimal::new(10001, 3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Validate a decimal amount as a price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] for zero or negative amounts and
    /// [`PriceError::TooPrecise`] for fractions of a cent.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_non_positive() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(Decimal::new(-100, 2)), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_price_allows_trailing_zeros() {
        // 10.000 normalizes to 10
        assert!(Price::new(Decimal::new(10000, 3)).is_ok());
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(price.to_string(), "$5.00");
    }

    #[test]
    fn test_price_deserializes_from_string() {
        let price: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));

        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
    }
}
