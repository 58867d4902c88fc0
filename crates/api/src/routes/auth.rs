//! Signup, login, token refresh and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{LoginRequest, LoginResponse, LogoutRequest, RefreshTokenRequest, SignupRequest, User};
use crate::response::{self, Envelope};
use crate::services::AuthService;
use crate::state::AppState;

/// POST /api/v1/auth/signup
#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Envelope<User>> {
    let Json(req) = body?;
    let user = AuthService::new(state.pool(), state.jwt()).signup(&req).await?;

    let name = user.first_name.clone();
    state
        .notifications()
        .spawn("welcome", |n| n.render_welcome(user.email.as_str(), &name));

    Ok(response::created("User created successfully", user))
}

/// POST /api/v1/auth/login
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Envelope<LoginResponse>> {
    let Json(req) = body?;
    let login = AuthService::new(state.pool(), state.jwt()).login(&req).await?;
    Ok(response::ok("Login successful", login))
}

/// POST /api/v1/auth/refresh
#[instrument(skip(state, body))]
pub async fn refresh(
    State(state): State<AppState>,
    body: std::result::Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Envelope<Value>> {
    let Json(req) = body?;
    let token = AuthService::new(state.pool(), state.jwt())
        .refresh(&req.refresh_token)
        .await?;
    Ok(response::ok(
        "Token refreshed successfully",
        json!({ "token": token }),
    ))
}

/// POST /api/v1/auth/logout
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Envelope<()>> {
    let Json(req) = body?;
    AuthService::new(state.pool(), state.jwt())
        .logout(user.id, &req.refresh_token)
        .await?;
    Ok(response::message("Logged out successfully"))
}
