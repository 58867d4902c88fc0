//! Product review service.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{ProductId, Rating, RatingError, ReviewId, UserId};

use crate::db::{ProductRepository, RepositoryError, ReviewRepository};
use crate::models::{CreateReviewRequest, PageQuery, Review, UpdateReviewRequest, non_empty};

/// Default page size for review listings.
pub const DEFAULT_REVIEW_LIMIT: i64 = 20;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("review not found")]
    NotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("{0}")]
    InvalidRating(#[from] RatingError),

    #[error("you have already reviewed this product")]
    AlreadyReviewed,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Review service.
pub struct ReviewService<'a> {
    reviews: ReviewRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Review a product; one review per user per product.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating`, `ReviewError::ProductNotFound` or
    /// `ReviewError::AlreadyReviewed`.
    #[tracing::instrument(skip(self, req), fields(product_id = %req.product_id))]
    pub async fn create(&self, user_id: UserId, req: CreateReviewRequest) -> Result<Review, ReviewError> {
        let rating = Rating::new(req.rating)?;

        if self.products.get_active(req.product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound);
        }

        let title = non_empty(req.title);
        let comment = non_empty(req.comment);
        self.reviews
            .create(
                req.product_id,
                user_id,
                rating.stars(),
                title.as_deref(),
                comment.as_deref(),
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ReviewError::AlreadyReviewed,
                other => ReviewError::Repository(other),
            })
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        page: PageQuery,
    ) -> Result<Vec<Review>, ReviewError> {
        let (limit, offset) = page.resolve(DEFAULT_REVIEW_LIMIT);
        Ok(self
            .reviews
            .list_for_product(product_id, limit, offset)
            .await?)
    }

    /// Partially update one of the caller's reviews.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the review is not the caller's.
    pub async fn update(
        &self,
        user_id: UserId,
        review_id: ReviewId,
        req: UpdateReviewRequest,
    ) -> Result<Review, ReviewError> {
        let rating = req.rating.map(Rating::new).transpose()?;
        let update = UpdateReviewRequest {
            rating: rating.map(|r| r.stars()),
            title: non_empty(req.title),
            comment: non_empty(req.comment),
        };

        self.reviews
            .update_owned(review_id, user_id, &update)
            .await
            .map_err(not_found)
    }

    /// Delete one of the caller's reviews.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if the review is not the caller's.
    pub async fn delete(&self, user_id: UserId, review_id: ReviewId) -> Result<(), ReviewError> {
        self.reviews
            .delete_owned(review_id, user_id)
            .await
            .map_err(not_found)
    }
}

fn not_found(e: RepositoryError) -> ReviewError {
    match e {
        RepositoryError::NotFound => ReviewError::NotFound,
        other => ReviewError::Repository(other),
    }
}
