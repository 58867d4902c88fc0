//! Reviews written by the caller.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::instrument;

use bazaar_core::ReviewId;

use super::parse_id;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::response::{self, Envelope};
use crate::services::ReviewService;
use crate::state::AppState;

/// POST /api/v1/reviews
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<Envelope<Review>> {
    let Json(req) = body?;
    let review = ReviewService::new(state.pool()).create(user.id, req).await?;
    Ok(response::created("Review created successfully", review))
}

/// PUT /api/v1/reviews/{id}
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Result<Envelope<Review>> {
    let id: ReviewId = parse_id(&id, "review")?;
    let Json(req) = body?;
    let review = ReviewService::new(state.pool())
        .update(user.id, id, req)
        .await?;
    Ok(response::ok("Review updated successfully", review))
}

/// DELETE /api/v1/reviews/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<()>> {
    let id: ReviewId = parse_id(&id, "review")?;
    ReviewService::new(state.pool()).delete(user.id, id).await?;
    Ok(response::message("Review deleted successfully"))
}
