//! Catalog and inventory management. Every handler requires the `admin` role.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use tracing::instrument;

use bazaar_core::{CategoryId, InventoryId, ProductId};

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{
    Category, CreateCategoryRequest, CreateProductRequest, Inventory, PageQuery, Product,
    UpdateCategoryRequest, UpdateInventoryRequest, UpdateProductRequest,
};
use crate::response::{self, Envelope};
use crate::services::{CatalogService, InventoryService};
use crate::state::AppState;

// =============================================================================
// Products
// =============================================================================

/// POST /api/v1/admin/products
#[instrument(skip(state, _admin, body))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    body: std::result::Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<Envelope<Product>> {
    let Json(req) = body?;
    let product = CatalogService::new(state.pool())
        .create_product(&req)
        .await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
    Ok(response::created("Product created successfully", product))
}

/// GET /api/v1/admin/products/{id}
#[instrument(skip(state, _admin))]
pub async fn show_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Envelope<Product>> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = CatalogService::new(state.pool())
        .get_product_admin(id)
        .await?;
    Ok(response::ok("Product retrieved successfully", product))
}

/// PUT /api/v1/admin/products/{id}
#[instrument(skip(state, _admin, body))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Envelope<Product>> {
    let id: ProductId = parse_id(&id, "product")?;
    let Json(req) = body?;
    let product = CatalogService::new(state.pool())
        .update_product(id, req)
        .await?;
    Ok(response::ok("Product updated successfully", product))
}

/// DELETE /api/v1/admin/products/{id}
#[instrument(skip(state, _admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: ProductId = parse_id(&id, "product")?;
    CatalogService::new(state.pool()).delete_product(id).await?;
    Ok(response::message("Product deleted successfully"))
}

// =============================================================================
// Categories
// =============================================================================

/// POST /api/v1/admin/categories
#[instrument(skip(state, _admin, body))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    body: std::result::Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<Envelope<Category>> {
    let Json(req) = body?;
    let category = CatalogService::new(state.pool())
        .create_category(&req)
        .await?;
    Ok(response::created("Category created successfully", category))
}

/// GET /api/v1/admin/categories/{id}
#[instrument(skip(state, _admin))]
pub async fn show_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Envelope<Category>> {
    let id: CategoryId = parse_id(&id, "category")?;
    let category = CatalogService::new(state.pool())
        .get_category_admin(id)
        .await?;
    Ok(response::ok("Category retrieved successfully", category))
}

/// PUT /api/v1/admin/categories/{id}
#[instrument(skip(state, _admin, body))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<Envelope<Category>> {
    let id: CategoryId = parse_id(&id, "category")?;
    let Json(req) = body?;
    let category = CatalogService::new(state.pool())
        .update_category(id, req)
        .await?;
    Ok(response::ok("Category updated successfully", category))
}

/// DELETE /api/v1/admin/categories/{id}
#[instrument(skip(state, _admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: CategoryId = parse_id(&id, "category")?;
    CatalogService::new(state.pool()).delete_category(id).await?;
    Ok(response::message("Category deleted successfully"))
}

// =============================================================================
// Inventory
// =============================================================================

/// GET /api/v1/admin/inventory
#[instrument(skip(state, _admin, page))]
pub async fn list_inventory(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Envelope<Vec<Inventory>>> {
    let Query(page) = page?;
    let rows = InventoryService::new(state.pool()).list(page).await?;
    Ok(response::ok("Inventory retrieved successfully", rows))
}

/// PUT /api/v1/admin/inventory/{id}
#[instrument(skip(state, _admin, body))]
pub async fn update_inventory(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateInventoryRequest>, JsonRejection>,
) -> Result<Envelope<Inventory>> {
    let id: InventoryId = parse_id(&id, "inventory")?;
    let Json(req) = body?;
    let inventory = InventoryService::new(state.pool())
        .update(id, req.quantity)
        .await?;
    tracing::info!(inventory_id = %id, quantity = req.quantity, "Inventory updated");
    Ok(response::ok("Inventory updated successfully", inventory))
}
