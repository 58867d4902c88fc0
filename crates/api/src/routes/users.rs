//! The caller's own profile.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{ChangePasswordRequest, UpdateProfileRequest, User};
use crate::response::{self, Envelope};
use crate::services::AuthService;
use crate::state::AppState;

/// GET /api/v1/users/me
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<User>> {
    let profile = AuthService::new(state.pool(), state.jwt())
        .get_user(user.id)
        .await?;
    Ok(response::ok("Profile retrieved successfully", profile))
}

/// PUT /api/v1/users/me
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Envelope<User>> {
    let Json(req) = body?;
    let profile = AuthService::new(state.pool(), state.jwt())
        .update_profile(user.id, req)
        .await?;
    Ok(response::ok("Profile updated successfully", profile))
}

/// PUT /api/v1/users/me/password
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Envelope<()>> {
    let Json(req) = body?;
    AuthService::new(state.pool(), state.jwt())
        .change_password(user.id, &req)
        .await?;
    Ok(response::message("Password changed successfully"))
}
