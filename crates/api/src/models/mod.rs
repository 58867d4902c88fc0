//! Domain models and request/response payloads.
//!
//! Row types derive `sqlx::FromRow`; payloads derive `Deserialize`. Optional
//! fields on update payloads leave the stored value unchanged when absent.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod review;
pub mod user;

use serde::Deserialize;

pub use address::{CreateAddressRequest, ShippingAddress, UpdateAddressRequest};
pub use cart::{AddItemRequest, Cart, CartItem, UpdateItemRequest};
pub use catalog::{
    Category, CreateCategoryRequest, CreateProductRequest, Product, ProductFilter,
    UpdateCategoryRequest, UpdateProductRequest,
};
pub use inventory::{Inventory, UpdateInventoryRequest};
pub use order::{CreateOrderRequest, Order, OrderItem};
pub use payment::{CreatePaymentRequest, Payment, WebhookPayload};
pub use review::{CreateReviewRequest, Review, UpdateReviewRequest};
pub use user::{
    ChangePasswordRequest, CurrentUser, LoginRequest, LoginResponse, LogoutRequest,
    RefreshTokenRequest, SignupRequest, UpdateProfileRequest, User,
};

/// `limit`/`offset` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Upper bound on any page size.
pub const MAX_PAGE_SIZE: i64 = 100;

impl PageQuery {
    /// Resolve to `(limit, offset)`; non-positive limits fall back to `default_limit`.
    #[must_use]
    pub fn resolve(self, default_limit: i64) -> (i64, i64) {
        let limit = match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => default_limit,
        };
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Treat empty strings from clients as "not provided".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(PageQuery::default().resolve(20), (20, 0));
        assert_eq!(
            PageQuery { limit: Some(0), offset: Some(-4) }.resolve(50),
            (50, 0)
        );
    }

    #[test]
    fn test_page_caps_limit() {
        let page = PageQuery { limit: Some(10_000), offset: Some(40) };
        assert_eq!(page.resolve(20), (MAX_PAGE_SIZE, 40));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }
}
