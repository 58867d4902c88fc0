//! Shopping cart service.
//!
//! Every user has at most one cart, created the first time it is needed.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{CartItemId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{AddItemRequest, Cart, CartItem};

/// Most units of one product a cart line can hold.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart item not found")]
    ItemNotFound,

    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    #[error("quantity cannot exceed {MAX_LINE_QUANTITY}")]
    QuantityTooLarge,

    #[error("product not found or inactive")]
    ProductUnavailable,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The caller's cart with items and total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        Ok(self.carts.get_cart(user_id).await?)
    }

    /// Add a product, merging with an existing line for it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a non-positive quantity,
    /// `CartError::QuantityTooLarge` when the merged line would exceed
    /// [`MAX_LINE_QUANTITY`], `CartError::ProductUnavailable` for a missing
    /// or inactive product.
    #[tracing::instrument(skip(self, req), fields(product_id = %req.product_id, quantity = req.quantity))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        req: &AddItemRequest,
    ) -> Result<CartItem, CartError> {
        check_quantity(req.quantity)?;

        let product = self
            .products
            .get_active(req.product_id)
            .await?
            .ok_or(CartError::ProductUnavailable)?;

        let cart_id = self.carts.get_or_create_id(user_id).await?;
        self.carts
            .add_item(
                cart_id,
                product.id,
                req.quantity,
                product.price,
                MAX_LINE_QUANTITY,
            )
            .await?
            .ok_or(CartError::QuantityTooLarge)
    }

    /// Set the quantity of one of the caller's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a non-positive quantity,
    /// `CartError::QuantityTooLarge` above [`MAX_LINE_QUANTITY`],
    /// `CartError::ItemNotFound` if the line is not in the caller's cart.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, CartError> {
        check_quantity(quantity)?;

        let cart_id = self.carts.get_or_create_id(user_id).await?;
        self.carts
            .update_item(cart_id, item_id, quantity)
            .await
            .map_err(item_not_found)
    }

    /// Remove one of the caller's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in the caller's cart.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        let cart_id = self.carts.get_or_create_id(user_id).await?;
        self.carts
            .remove_item(cart_id, item_id)
            .await
            .map_err(item_not_found)
    }

    /// Remove every line from the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        let cart_id = self.carts.get_or_create_id(user_id).await?;
        let removed = self.carts.clear(cart_id).await?;
        tracing::debug!(user_id = %user_id, removed, "Cart cleared");
        Ok(())
    }
}

const fn check_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity);
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::QuantityTooLarge);
    }
    Ok(())
}

fn item_not_found(e: RepositoryError) -> CartError {
    match e {
        RepositoryError::NotFound => CartError::ItemNotFound,
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_quantity() {
        assert!(check_quantity(1).is_ok());
        assert!(matches!(check_quantity(0), Err(CartError::InvalidQuantity)));
        assert!(matches!(check_quantity(-3), Err(CartError::InvalidQuantity)));
    }

    #[test]
    fn test_check_quantity_caps_line() {
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            check_quantity(MAX_LINE_QUANTITY + 1),
            Err(CartError::QuantityTooLarge)
        ));
        assert!(matches!(check_quantity(i32::MAX), Err(CartError::QuantityTooLarge)));
        assert_eq!(
            CartError::QuantityTooLarge.to_string(),
            "quantity cannot exceed 10000"
        );
    }

    #[test]
    fn test_foreign_item_reads_as_missing() {
        assert!(matches!(
            item_not_found(RepositoryError::NotFound),
            CartError::ItemNotFound
        ));
    }
}
