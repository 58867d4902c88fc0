//! HS256 access tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use bazaar_core::{UserId, UserRole};

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::CurrentUser;

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Sign an access token for a user.
///
/// # Errors
///
/// Returns `AuthError::TokenEncoding` if signing fails.
pub fn issue_token(
    config: &JwtConfig,
    user_id: UserId,
    email: &str,
    role: UserRole,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        email: email.to_string(),
        role,
        exp: (now + Duration::hours(config.expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_bytes()),
    )?;
    Ok(token)
}

/// Validate signature and expiry and return the claims.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` for any invalid or expired token.
pub fn validate_token(config: &JwtConfig, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AuthError::InvalidToken
    })
}
