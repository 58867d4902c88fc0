//! Saved shipping addresses.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::instrument;

use bazaar_core::AddressId;

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CreateAddressRequest, ShippingAddress, UpdateAddressRequest};
use crate::response::{self, Envelope};
use crate::services::ShippingService;
use crate::state::AppState;

/// GET /api/v1/shipping/addresses
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<Vec<ShippingAddress>>> {
    let addresses = ShippingService::new(state.pool()).list(user.id).await?;
    Ok(response::ok("Addresses retrieved successfully", addresses))
}

/// POST /api/v1/shipping/addresses
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreateAddressRequest>, JsonRejection>,
) -> Result<Envelope<ShippingAddress>> {
    let Json(req) = body?;
    let address = ShippingService::new(state.pool())
        .create(user.id, &req)
        .await?;
    Ok(response::created("Address created successfully", address))
}

/// PUT /api/v1/shipping/addresses/{id}
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> Result<Envelope<ShippingAddress>> {
    let id: AddressId = parse_id(&id, "address")?;
    let Json(req) = body?;
    let address = ShippingService::new(state.pool())
        .update(user.id, id, req)
        .await?;
    Ok(response::ok("Address updated successfully", address))
}

/// DELETE /api/v1/shipping/addresses/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: AddressId = parse_id(&id, "address")?;
    ShippingService::new(state.pool()).delete(user.id, id).await?;
    Ok(response::message("Address deleted successfully"))
}
