//! Inventory service.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{InventoryId, ProductId};

use crate::db::{InventoryRepository, RepositoryError};
use crate::models::{Inventory, PageQuery};

/// Default page size for the admin inventory list.
pub const DEFAULT_INVENTORY_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory not found")]
    NotFound,

    #[error("quantity cannot be negative")]
    NegativeQuantity,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Inventory service.
pub struct InventoryService<'a> {
    inventory: InventoryRepository<'a>,
}

impl<'a> InventoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            inventory: InventoryRepository::new(pool),
        }
    }

    /// Stock for a product.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NotFound` if the product has no stock row.
    pub async fn get_by_product(&self, product_id: ProductId) -> Result<Inventory, InventoryError> {
        self.inventory
            .get_by_product(product_id)
            .await?
            .ok_or(InventoryError::NotFound)
    }

    /// Page through stock rows ordered by product.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn list(&self, page: PageQuery) -> Result<Vec<Inventory>, InventoryError> {
        let (limit, offset) = page.resolve(DEFAULT_INVENTORY_LIMIT);
        Ok(self.inventory.list(limit, offset).await?)
    }

    /// Set the on-hand quantity of a stock row.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::NegativeQuantity` for `quantity < 0`,
    /// `InventoryError::NotFound` if the row does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: InventoryId, quantity: i32) -> Result<Inventory, InventoryError> {
        if quantity < 0 {
            return Err(InventoryError::NegativeQuantity);
        }

        let inventory = self
            .inventory
            .set_quantity(id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => InventoryError::NotFound,
                other => InventoryError::Repository(other),
            })?;

        tracing::info!(product_id = %inventory.product_id, quantity, "Inventory updated");
        Ok(inventory)
    }

    /// Whether `quantity` units of a product are available.
    ///
    /// A product without a stock row has nothing available.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn check_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, InventoryError> {
        fulfils(self.get_by_product(product_id).await, quantity)
    }

    /// Take `quantity` units from stock, guarded by the on-hand count.
    ///
    /// Returns `false` and leaves the row untouched when too few units remain.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the update fails.
    #[tracing::instrument(skip(self))]
    pub async fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, InventoryError> {
        let reduced = self.inventory.reduce_stock(product_id, quantity).await?;
        if !reduced {
            tracing::warn!(product_id = %product_id, quantity, "Stock reduction refused");
        }
        Ok(reduced)
    }

    /// Rows with available stock at or below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Repository` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Inventory>, InventoryError> {
        Ok(self.inventory.low_stock(threshold).await?)
    }
}

fn fulfils(
    lookup: Result<Inventory, InventoryError>,
    quantity: i32,
) -> Result<bool, InventoryError> {
    match lookup {
        Ok(inventory) => Ok(inventory.stock().can_fulfil(quantity)),
        Err(InventoryError::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn inventory(quantity: i32, reserved: i32) -> Inventory {
        Inventory {
            id: InventoryId::new(1),
            product_id: ProductId::new(7),
            quantity,
            reserved,
            available: quantity - reserved,
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_fulfils_counts_reserved_units() {
        assert!(fulfils(Ok(inventory(5, 0)), 5).unwrap());
        assert!(!fulfils(Ok(inventory(5, 1)), 5).unwrap());
    }

    #[test]
    fn test_missing_stock_row_fulfils_nothing() {
        assert!(!fulfils(Err(InventoryError::NotFound), 1).unwrap());
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let err = fulfils(Err(InventoryError::Repository(RepositoryError::NotFound)), 1);
        assert!(matches!(err, Err(InventoryError::Repository(_))));
    }
}
