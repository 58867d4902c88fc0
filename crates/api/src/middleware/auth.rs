//! Bearer-token authentication extractors.
//!
//! ```rust,ignore
//! async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Extractor that requires a valid access token.
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid access token with the `admin` role.
pub struct RequireAdmin(pub CurrentUser);

/// Why a bearer header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerError {
    Missing,
    Malformed,
}

impl From<BearerError> for AppError {
    fn from(err: BearerError) -> Self {
        let message = match err {
            BearerError::Missing => "Authorization header required",
            BearerError::Malformed => "Invalid authorization header format",
        };
        Self::Unauthorized(message.to_string())
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// # Errors
///
/// Returns `BearerError::Missing` for an absent or empty header and
/// `BearerError::Malformed` for anything but exactly `Bearer` and one token.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, BearerError> {
    let value = header
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(BearerError::Missing)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(BearerError::Malformed),
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| BearerError::Malformed)?),
        None => None,
    };
    let token = parse_bearer(header)?;

    let claims = AuthService::authenticate(state.jwt(), token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    let user = CurrentUser::from(claims);

    Span::current().record("user_id", user.id.as_i64());
    set_sentry_user(&user.id, Some(&user.email));
    Ok(user)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_ok() {
        assert_eq!(parse_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_parse_bearer_missing() {
        assert_eq!(parse_bearer(None), Err(BearerError::Missing));
        assert_eq!(parse_bearer(Some("  ")), Err(BearerError::Missing));
    }

    #[test]
    fn test_parse_bearer_malformed() {
        for header in ["abc", "Basic abc", "bearer abc", "Bearer", "Bearer a b", "Bearer  abc"] {
            assert_eq!(
                parse_bearer(Some(header)),
                Err(BearerError::Malformed),
                "{header}"
            );
        }
    }

    #[test]
    fn test_bearer_messages() {
        assert_eq!(
            AppError::from(BearerError::Missing).public_message(),
            "Authorization header required"
        );
        assert_eq!(
            AppError::from(BearerError::Malformed).public_message(),
            "Invalid authorization header format"
        );
    }
}
