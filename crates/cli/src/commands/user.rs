//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar user promote jane@example.com
//! bazaar user deactivate john@example.com
//! ```

use bazaar_api::db::{RepositoryError, UserRepository};
use bazaar_core::{Email, EmailError, UserRole};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No user with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(#[source] RepositoryError),
}

fn lookup_error(email: &Email) -> impl FnOnce(RepositoryError) -> UserCommandError + '_ {
    move |e| match e {
        RepositoryError::NotFound => UserCommandError::NotFound(email.to_string()),
        other => UserCommandError::Repository(other),
    }
}

/// Grant the admin role.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists, or the
/// database is unreachable.
pub async fn promote(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(UserCommandError::from)?;
    let pool = super::connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, UserRole::Admin)
        .await
        .map_err(lookup_error(&email))?;

    tracing::info!(user_id = %user.id, email = %email, "User promoted to admin");
    Ok(())
}

/// Deactivate an account. Existing access tokens stay valid until they expire.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists, or the
/// database is unreachable.
pub async fn deactivate(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(UserCommandError::from)?;
    let pool = super::connect().await?;

    let user = UserRepository::new(&pool)
        .set_active(&email, false)
        .await
        .map_err(lookup_error(&email))?;

    tracing::info!(user_id = %user.id, email = %email, "User deactivated");
    Ok(())
}
