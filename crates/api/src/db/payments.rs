//! Payment repository.

use sqlx::PgPool;

use bazaar_core::{OrderId, PaymentId, PaymentStatus};

use super::RepositoryError;
use crate::models::Payment;
use crate::models::payment::NewPayment;

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, amount, currency, payment_method, \
                               transaction_id, status, payment_gateway, gateway_response, \
                               created_at, updated_at";

/// Repository for payment attempts.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, payment: &NewPayment) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r"
            INSERT INTO payments (order_id, user_id, amount, currency, payment_method,
                                  transaction_id, status, payment_gateway, gateway_response)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(payment.order_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.method)
        .bind(payment.transaction_id.as_deref())
        .bind(payment.status)
        .bind(payment.method.as_str())
        .bind(payment.gateway_response.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Most recent payment for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a gateway callback to a payment.
    ///
    /// A `None` transaction id keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment does not exist.
    pub async fn apply_webhook(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
        gateway_response: &str,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r"
            UPDATE payments
            SET status = $2,
                transaction_id = COALESCE($3, transaction_id),
                gateway_response = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(transaction_id)
        .bind(gateway_response)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }
}
