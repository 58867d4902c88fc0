//! Order placement and history.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use tracing::instrument;

use bazaar_core::OrderId;

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CreateOrderRequest, Order, PageQuery};
use crate::response::{self, Envelope};
use crate::services::{AuthService, OrderService};
use crate::state::AppState;

/// GET /api/v1/orders
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Envelope<Vec<Order>>> {
    let Query(page) = page?;
    let orders = OrderService::for_pool(state.pool())
        .list_orders(user.id, page)
        .await?;
    Ok(response::ok("Orders retrieved successfully", orders))
}

/// POST /api/v1/orders
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Envelope<Order>> {
    let Json(req) = body?;
    let order = OrderService::for_pool(state.pool())
        .create_order(user.id, &req)
        .await?;

    let name = match AuthService::new(state.pool(), state.jwt())
        .get_user(user.id)
        .await
    {
        Ok(profile) => profile.first_name,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load name for confirmation email");
            user.email.clone()
        }
    };
    state.notifications().spawn("order_confirmation", |n| {
        n.render_order_confirmation(&user.email, &name, &order)
    });

    Ok(response::created("Order created successfully", order))
}

/// GET /api/v1/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<Order>> {
    let id: OrderId = parse_id(&id, "order")?;
    let order = OrderService::for_pool(state.pool())
        .get_order(user.id, id)
        .await?;
    Ok(response::ok("Order retrieved successfully", order))
}

/// POST /api/v1/orders/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: OrderId = parse_id(&id, "order")?;
    OrderService::for_pool(state.pool())
        .cancel_order(user.id, id)
        .await?;
    Ok(response::message("Order cancelled successfully"))
}
