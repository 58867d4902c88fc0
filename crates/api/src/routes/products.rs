//! Public catalog: products and their reviews.

use axum::extract::{Path, Query, State, rejection::QueryRejection};
use tracing::instrument;

use bazaar_core::ProductId;

use super::parse_id;
use crate::error::Result;
use crate::models::catalog::SearchQuery;
use crate::models::{PageQuery, Product, ProductFilter, Review};
use crate::response::{self, Envelope};
use crate::services::{CatalogService, ReviewService};
use crate::state::AppState;

/// GET /api/v1/products
#[instrument(skip(state, query))]
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Envelope<Vec<Product>>> {
    let Query(filter) = query?;
    let products = CatalogService::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(response::ok("Products retrieved successfully", products))
}

/// GET /api/v1/products/search?q=
#[instrument(skip(state, query))]
pub async fn search(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Envelope<Vec<Product>>> {
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let products = CatalogService::new(state.pool())
        .search_products(query.q.as_deref(), page)
        .await?;
    Ok(response::ok("Search results", products))
}

/// GET /api/v1/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Product>> {
    let id: ProductId = parse_id(&id, "product")?;
    let product = CatalogService::new(state.pool()).get_product(id).await?;
    Ok(response::ok("Product retrieved successfully", product))
}

/// GET /api/v1/products/{id}/reviews
#[instrument(skip(state, page))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    page: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Envelope<Vec<Review>>> {
    let id: ProductId = parse_id(&id, "product")?;
    let Query(page) = page?;
    let reviews = ReviewService::new(state.pool())
        .list_for_product(id, page)
        .await?;
    Ok(response::ok("Reviews retrieved successfully", reviews))
}
