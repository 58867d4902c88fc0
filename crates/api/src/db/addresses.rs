//! Shipping address repository.
//!
//! At most one address per user has `is_default` set; setting it on one row
//! clears it on the others first.

use sqlx::PgPool;

use bazaar_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{CreateAddressRequest, ShippingAddress, UpdateAddressRequest};

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone_number, address_line1, \
                               address_line2, city, state, postal_code, country, is_default, \
                               created_at, updated_at";

/// Repository for saved shipping addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        req: &CreateAddressRequest,
    ) -> Result<ShippingAddress, RepositoryError> {
        if req.is_default {
            self.clear_default(user_id).await?;
        }

        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            INSERT INTO shipping_addresses (user_id, full_name, phone_number, address_line1,
                                            address_line2, city, state, postal_code, country,
                                            is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&req.full_name)
        .bind(&req.phone_number)
        .bind(&req.address_line1)
        .bind(req.address_line2.as_deref())
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.postal_code)
        .bind(&req.country)
        .bind(req.is_default)
        .fetch_one(self.pool)
        .await?;

        Ok(address)
    }

    /// A user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShippingAddress>, RepositoryError> {
        let addresses = sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM shipping_addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// An address owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shipping_addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Apply a partial update to an address owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such address belongs to the user.
    pub async fn update_owned(
        &self,
        id: AddressId,
        user_id: UserId,
        req: &UpdateAddressRequest,
    ) -> Result<ShippingAddress, RepositoryError> {
        if self.get_owned(id, user_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        if req.is_default == Some(true) {
            self.clear_default(user_id).await?;
        }

        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            UPDATE shipping_addresses
            SET full_name = COALESCE($3, full_name),
                phone_number = COALESCE($4, phone_number),
                address_line1 = COALESCE($5, address_line1),
                address_line2 = COALESCE($6, address_line2),
                city = COALESCE($7, city),
                state = COALESCE($8, state),
                postal_code = COALESCE($9, postal_code),
                country = COALESCE($10, country),
                is_default = COALESCE($11, is_default),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.full_name.as_deref())
        .bind(req.phone_number.as_deref())
        .bind(req.address_line1.as_deref())
        .bind(req.address_line2.as_deref())
        .bind(req.city.as_deref())
        .bind(req.state.as_deref())
        .bind(req.postal_code.as_deref())
        .bind(req.country.as_deref())
        .bind(req.is_default)
        .fetch_optional(self.pool)
        .await?;

        address.ok_or(RepositoryError::NotFound)
    }

    /// Delete an address owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such address belongs to the user.
    pub async fn delete_owned(&self, id: AddressId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shipping_addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_default(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE shipping_addresses SET is_default = FALSE, updated_at = NOW() \
             WHERE user_id = $1 AND is_default = TRUE",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
