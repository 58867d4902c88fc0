//! Authentication and account service.
//!
//! Password logins issue a short-lived HS256 access token plus a stored
//! refresh token (UUID v4, seven days). Refreshing only mints a new access
//! token; the refresh token itself is not rotated.

mod error;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use jwt::Claims;
pub use password::{hash_password, validate_password, verify_password};

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{Email, UserId, UserRole};

use crate::config::JwtConfig;
use crate::db::users::NewUser;
use crate::db::{RefreshTokenRepository, RepositoryError, UserRepository};
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, User,
    non_empty,
};

/// Refresh token lifetime.
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    refresh_tokens: RefreshTokenRepository<'a>,
    jwt: &'a JwtConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt: &'a JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            refresh_tokens: RefreshTokenRepository::new(pool),
            jwt,
        }
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::MissingField` for bad input, `AuthError::EmailExists` if
    /// the email is taken.
    #[tracing::instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup(&self, req: &SignupRequest) -> Result<User, AuthError> {
        let email = Email::parse(&req.email)?;
        validate_password(&req.password)?;
        let first_name = required(&req.first_name, "first_name")?;
        let last_name = required(&req.last_name, "last_name")?;

        let password_hash = hash_password(&req.password)?;
        let phone_number = req
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let user = self
            .users
            .create(NewUser {
                email: &email,
                password_hash: &password_hash,
                first_name,
                last_name,
                phone_number,
                role: UserRole::Customer,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, `AuthError::AccountInactive` for a deactivated account.
    #[tracing::instrument(skip(self, req))]
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = Email::parse(&req.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&req.password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let token = jwt::issue_token(self.jwt, user.id, user.email.as_str(), user.role)?;
        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_DAYS);
        self.refresh_tokens
            .create(user.id, &refresh_token, expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            token,
            refresh_token,
            user,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` if the token is unknown,
    /// revoked or expired, or its user no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let stored = self
            .refresh_tokens
            .find_active(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let user = self
            .users
            .get_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        jwt::issue_token(self.jwt, user.id, user.email.as_str(), user.role)
    }

    /// Revoke one of the caller's refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` if the token is not an active
    /// token of `user_id`.
    pub async fn logout(&self, user_id: UserId, refresh_token: &str) -> Result<(), AuthError> {
        match self.refresh_tokens.find_active(refresh_token).await? {
            Some(token) if token.user_id == user_id => {
                self.refresh_tokens.revoke(refresh_token).await?;
                tracing::info!(user_id = %user_id, "Refresh token revoked");
                Ok(())
            }
            _ => Err(AuthError::InvalidRefreshToken),
        }
    }

    /// Decode an access token into the caller identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid or expired.
    pub fn authenticate(jwt: &JwtConfig, token: &str) -> Result<Claims, AuthError> {
        jwt::validate_token(jwt, token)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update name and phone; blank fields are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        req: UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        let update = UpdateProfileRequest {
            first_name: non_empty(req.first_name),
            last_name: non_empty(req.last_name),
            phone_number: non_empty(req.phone_number),
        };

        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change the caller's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if the current password does
    /// not verify, `AuthError::WeakPassword` if the new one is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        req: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(&req.current_password, &current_hash).map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::IncorrectPassword,
            other => other,
        })?;
        validate_password(&req.new_password)?;

        let new_hash = hash_password(&req.new_password)?;
        self.users.update_password(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

fn required<'s>(value: &'s str, field: &'static str) -> Result<&'s str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert!(matches!(required("  Ada ", "first_name"), Ok("Ada")));
    }

    #[test]
    fn test_required_rejects_blank() {
        let err = required("   ", "last_name").err();
        assert!(matches!(err, Some(AuthError::MissingField("last_name"))));
        assert_eq!(
            AuthError::MissingField("last_name").to_string(),
            "last_name is required"
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
        assert_eq!(AuthError::AccountInactive.to_string(), "account is inactive");
        assert_eq!(AuthError::EmailExists.to_string(), "email already exists");
        assert_eq!(
            AuthError::IncorrectPassword.to_string(),
            "current password is incorrect"
        );
    }
}
