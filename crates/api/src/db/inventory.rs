//! Inventory repository.

use sqlx::PgPool;

use bazaar_core::{InventoryId, ProductId};

use super::RepositoryError;
use crate::models::Inventory;
use crate::models::inventory::InventoryRow;

const INVENTORY_COLUMNS: &str = "id, product_id, quantity, reserved, updated_at";

/// Repository for stock records.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the stock row for a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_for_product(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Inventory, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r"
            INSERT INTO inventory (product_id, quantity)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET product_id = EXCLUDED.product_id
            RETURNING {INVENTORY_COLUMNS}
            "
        ))
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Seed stock for a product, leaving an existing row untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_if_absent(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO inventory (product_id, quantity) VALUES ($1, $2) ON CONFLICT (product_id) DO NOTHING",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stock row for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Page through stock rows by product id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Inventory>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory ORDER BY product_id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set the on-hand quantity and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn set_quantity(
        &self,
        id: InventoryId,
        quantity: i32,
    ) -> Result<Inventory, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r"
            UPDATE inventory SET quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {INVENTORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Take `quantity` units from stock if enough are on hand.
    ///
    /// Returns `false` when the guard rejected the decrement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn reduce_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE inventory
            SET quantity = quantity - $2, updated_at = NOW()
            WHERE product_id = $1 AND quantity >= $2
            ",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rows whose available stock is at or below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Inventory>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            r"
            SELECT {INVENTORY_COLUMNS} FROM inventory
            WHERE quantity - reserved <= $1
            ORDER BY quantity - reserved, product_id
            "
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
