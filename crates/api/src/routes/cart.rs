//! The caller's shopping cart.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::instrument;

use bazaar_core::CartItemId;

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{AddItemRequest, Cart, CartItem, UpdateItemRequest};
use crate::response::{self, Envelope};
use crate::services::CartService;
use crate::state::AppState;

/// GET /api/v1/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<Cart>> {
    let cart = CartService::new(state.pool()).get_cart(user.id).await?;
    Ok(response::ok("Cart retrieved successfully", cart))
}

/// POST /api/v1/cart/items
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Envelope<CartItem>> {
    let Json(req) = body?;
    let item = CartService::new(state.pool()).add_item(user.id, &req).await?;
    Ok(response::ok("Item added to cart", item))
}

/// PUT /api/v1/cart/items/{id}
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Envelope<CartItem>> {
    let id: CartItemId = parse_id(&id, "item")?;
    let Json(req) = body?;
    let item = CartService::new(state.pool())
        .update_item(user.id, id, req.quantity)
        .await?;
    Ok(response::ok("Cart item updated", item))
}

/// DELETE /api/v1/cart/items/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: CartItemId = parse_id(&id, "item")?;
    CartService::new(state.pool()).remove_item(user.id, id).await?;
    Ok(response::message("Item removed from cart"))
}

/// DELETE /api/v1/cart/clear
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<()>> {
    CartService::new(state.pool()).clear(user.id).await?;
    Ok(response::message("Cart cleared successfully"))
}
