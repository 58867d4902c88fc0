//! Saved shipping addresses.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{AddressId, UserId};

use crate::db::{AddressRepository, RepositoryError};
use crate::models::{CreateAddressRequest, ShippingAddress, UpdateAddressRequest, non_empty};

#[derive(Debug, Error)]
pub enum ShippingError {
    #[error("address not found")]
    NotFound,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Shipping address service.
pub struct ShippingService<'a> {
    addresses: AddressRepository<'a>,
}

impl<'a> ShippingService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            addresses: AddressRepository::new(pool),
        }
    }

    /// The caller's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::Repository` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<ShippingAddress>, ShippingError> {
        Ok(self.addresses.list_for_user(user_id).await?)
    }

    /// Save an address for the caller.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::MissingField` for the first blank required field.
    pub async fn create(
        &self,
        user_id: UserId,
        req: &CreateAddressRequest,
    ) -> Result<ShippingAddress, ShippingError> {
        validate(req)?;
        Ok(self.addresses.create(user_id, req).await?)
    }

    /// Partially update one of the caller's addresses.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::NotFound` if the address is not the caller's.
    pub async fn update(
        &self,
        user_id: UserId,
        address_id: AddressId,
        req: UpdateAddressRequest,
    ) -> Result<ShippingAddress, ShippingError> {
        let update = UpdateAddressRequest {
            full_name: non_empty(req.full_name),
            phone_number: non_empty(req.phone_number),
            address_line1: non_empty(req.address_line1),
            address_line2: non_empty(req.address_line2),
            city: non_empty(req.city),
            state: non_empty(req.state),
            postal_code: non_empty(req.postal_code),
            country: non_empty(req.country),
            is_default: req.is_default,
        };

        self.addresses
            .update_owned(address_id, user_id, &update)
            .await
            .map_err(not_found)
    }

    /// Delete one of the caller's addresses.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::NotFound` if the address is not the caller's.
    pub async fn delete(&self, user_id: UserId, address_id: AddressId) -> Result<(), ShippingError> {
        self.addresses
            .delete_owned(address_id, user_id)
            .await
            .map_err(not_found)
    }
}

fn validate(req: &CreateAddressRequest) -> Result<(), ShippingError> {
    let required = [
        ("full_name", &req.full_name),
        ("phone_number", &req.phone_number),
        ("address_line1", &req.address_line1),
        ("city", &req.city),
        ("state", &req.state),
        ("postal_code", &req.postal_code),
        ("country", &req.country),
    ];

    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ShippingError::MissingField(*field)),
        None => Ok(()),
    }
}

fn not_found(e: RepositoryError) -> ShippingError {
    match e {
        RepositoryError::NotFound => ShippingError::NotFound,
        other => ShippingError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> CreateAddressRequest {
        CreateAddressRequest {
            full_name: "Jane Smith".to_string(),
            phone_number: "+1-555-0100".to_string(),
            address_line1: "1 Main St".to_string(),
            address_line2: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
            is_default: true,
        }
    }

    #[test]
    fn test_validate_complete_address() {
        assert!(validate(&address()).is_ok());
    }

    #[test]
    fn test_validate_reports_first_blank_field() {
        let req = CreateAddressRequest {
            city: "  ".to_string(),
            country: String::new(),
            ..address()
        };
        let err = validate(&req).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("city is required"));
    }
}
