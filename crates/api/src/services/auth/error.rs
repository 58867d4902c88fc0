//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email already registered.
    #[error("email already exists")]
    EmailExists,

    /// Password too weak.
    #[error("{0}")]
    WeakPassword(String),

    /// Required field absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Current password did not verify during a change.
    #[error("current password is incorrect")]
    IncorrectPassword,

    /// Refresh token unknown, revoked or expired.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Access token failed validation.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// JWT could not be signed.
    #[error("token encoding error: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),
}
