//! Public category reads.

use axum::extract::{Path, State};
use tracing::instrument;

use bazaar_core::CategoryId;

use super::parse_id;
use crate::error::Result;
use crate::models::Category;
use crate::response::{self, Envelope};
use crate::services::CatalogService;
use crate::state::AppState;

/// GET /api/v1/categories
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Envelope<Vec<Category>>> {
    let categories = CatalogService::new(state.pool()).list_categories().await?;
    Ok(response::ok("Categories retrieved successfully", categories))
}

/// GET /api/v1/categories/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Category>> {
    let id: CategoryId = parse_id(&id, "category")?;
    let category = CatalogService::new(state.pool()).get_category(id).await?;
    Ok(response::ok("Category retrieved successfully", category))
}
