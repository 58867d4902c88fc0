//! Cart repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartItemRow, CartRow};
use crate::models::{Cart, CartItem};

const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, price, created_at, updated_at";

/// Repository for carts and their line items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Id of the user's cart, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_id(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        Ok(self.get_or_create(user_id).await?.id)
    }

    async fn get_or_create(&self, user_id: UserId) -> Result<CartRow, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// The user's cart with its lines, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = self.get_or_create(user_id).await?;
        let items = self.items(row.id).await?;
        Ok(Cart::assemble(row, items))
    }

    /// Lines of a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a line, summing quantities with an existing line for the product.
    ///
    /// Returns `None` and leaves the line unchanged when the sum would exceed
    /// `max_quantity`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        price: Decimal,
        max_quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            WHERE cart_items.quantity <= $5 - EXCLUDED.quantity
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .bind(max_quantity)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        self.touch(cart_id).await?;
        Ok(Some(row.into()))
    }

    /// Set a line's quantity. The line must belong to `cart_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such line is in the cart.
    pub async fn update_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            UPDATE cart_items SET quantity = $3, updated_at = NOW()
            WHERE id = $1 AND cart_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(item_id)
        .bind(cart_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        self.touch(cart_id).await?;
        Ok(row.into())
    }

    /// Remove a line. The line must belong to `cart_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such line is in the cart.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.touch(cart_id).await
    }

    /// Remove every line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        self.touch(cart_id).await?;
        Ok(result.rows_affected())
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
