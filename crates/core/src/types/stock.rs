//! Inventory stock levels.

use serde::{Deserialize, Serialize};

/// On-hand and reserved quantities for a product.
///
/// Availability is derived on every read and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: i32,
    pub reserved: i32,
}

impl StockLevel {
    #[must_use]
    pub const fn new(quantity: i32, reserved: i32) -> Self {
        Self { quantity, reserved }
    }

    /// Units that can still be sold: `quantity - reserved`.
    #[must_use]
    pub const fn available(&self) -> i32 {
        self.quantity - self.reserved
    }

    /// Whether `requested` units can be taken from available stock.
    #[must_use]
    pub const fn can_fulfil(&self, requested: i32) -> bool {
        self.available() >= requested
    }

    /// Whether availability has dropped to `threshold` or below.
    #[must_use]
    pub const fn is_low(&self, threshold: i32) -> bool {
        self.available() <= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_is_stable_across_checks() {
        let stock = StockLevel::new(5, 0);
        for _ in 0..3 {
            assert_eq!(stock.available(), 5);
        }
    }

    #[test]
    fn test_available_subtracts_reserved() {
        let stock = StockLevel::new(10, 3);
        assert_eq!(stock.available(), 7);
        assert!(stock.can_fulfil(7));
        assert!(!stock.can_fulfil(8));
    }

    #[test]
    fn test_is_low() {
        assert!(StockLevel::new(5, 0).is_low(5));
        assert!(!StockLevel::new(6, 0).is_low(5));
        assert!(StockLevel::new(6, 2).is_low(5));
    }
}
