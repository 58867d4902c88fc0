//! Payment service and gateway stubs.
//!
//! Gateways are stubbed: a configured gateway approves every charge with a
//! deterministic transaction id. Final status normally arrives later through
//! the gateway webhook, which updates the most recent payment of the order.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

use crate::config::PaymentConfig;
use crate::db::{OrderRepository, PaymentRepository, RepositoryError};
use crate::models::payment::NewPayment;
use crate::models::{CreatePaymentRequest, Payment, WebhookPayload};

/// Currency used when the request names none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// `gateway_response` written by webhook updates.
pub const WEBHOOK_RESPONSE: &str = "Webhook processed";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment not found")]
    NotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("invalid payment method")]
    InvalidMethod,

    #[error("invalid payment status: {0}")]
    InvalidStatus(String),

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A gateway refused or could not take the charge.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0} not configured")]
    NotConfigured(PaymentMethod),
}

// =============================================================================
// Gateways
// =============================================================================

/// Submit a charge to the gateway for `method`.
///
/// # Errors
///
/// Returns `GatewayError::NotConfigured` when the gateway has no credentials.
pub fn charge(
    config: &PaymentConfig,
    method: PaymentMethod,
    order_id: OrderId,
) -> Result<String, GatewayError> {
    match method {
        PaymentMethod::Stripe => {
            if config.stripe_secret_key.is_none() {
                return Err(GatewayError::NotConfigured(method));
            }
            Ok(format!("stripe_txn_{order_id}"))
        }
        PaymentMethod::Bkash => {
            if config.bkash_app_key.is_none() {
                return Err(GatewayError::NotConfigured(method));
            }
            Ok(format!("bkash_txn_{order_id}"))
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Check the `x-webhook-signature` header against the raw body.
///
/// Without a configured secret every body is accepted.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if a secret is configured and the
/// header is missing, not hex, or does not match.
pub fn verify_webhook_signature(
    secret: Option<&SecretString>,
    signature: Option<&str>,
    body: &[u8],
) -> Result<(), PaymentError> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let provided = signature
        .and_then(|sig| hex::decode(sig.trim()).ok())
        .ok_or(PaymentError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&provided)
        .map_err(|_| PaymentError::InvalidSignature)
}

// =============================================================================
// Service
// =============================================================================

/// Payment service.
pub struct PaymentService<'a> {
    payments: PaymentRepository<'a>,
    orders: OrderRepository<'a>,
    config: &'a PaymentConfig,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a PaymentConfig) -> Self {
        Self {
            payments: PaymentRepository::new(pool),
            orders: OrderRepository::new(pool),
            config,
        }
    }

    /// Charge the total of one of the caller's orders.
    ///
    /// A gateway refusal is recorded as a `failed` payment rather than
    /// returned as an error.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidMethod` for an unknown method and
    /// `PaymentError::OrderNotFound` if the order is not the caller's.
    #[tracing::instrument(skip(self, req), fields(order_id = %req.order_id, method = %req.payment_method))]
    pub async fn create_payment(
        &self,
        user_id: UserId,
        req: &CreatePaymentRequest,
    ) -> Result<Payment, PaymentError> {
        let method =
            PaymentMethod::from_str(&req.payment_method).map_err(|_| PaymentError::InvalidMethod)?;

        let order = self
            .orders
            .get(req.order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(PaymentError::OrderNotFound)?;

        let currency = req
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_uppercase();

        let (status, transaction_id, gateway_response) = match charge(self.config, method, order.id)
        {
            Ok(txn) => (PaymentStatus::Completed, Some(txn), None),
            Err(e) => {
                tracing::warn!(error = %e, "Gateway charge failed");
                (PaymentStatus::Failed, None, Some(e.to_string()))
            }
        };

        let payment = self
            .payments
            .create(&NewPayment {
                order_id: order.id,
                user_id,
                amount: order.total,
                currency,
                method,
                transaction_id,
                status,
                gateway_response,
            })
            .await?;

        self.mirror_onto_order(&payment).await?;

        tracing::info!(payment_id = %payment.id, status = %payment.status, "Payment recorded");
        Ok(payment)
    }

    /// One of the caller's payments.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if missing or someone else's.
    pub async fn get_payment(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Payment, PaymentError> {
        self.payments
            .get(payment_id)
            .await?
            .filter(|payment| payment.user_id == user_id)
            .ok_or(PaymentError::NotFound)
    }

    /// Apply a gateway callback to the latest payment of its order.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidStatus` for an unknown status and
    /// `PaymentError::NotFound` if the order has no payments.
    #[tracing::instrument(skip(self, payload), fields(order_id = %payload.order_id, status = %payload.status))]
    pub async fn handle_webhook(
        &self,
        gateway: PaymentMethod,
        payload: &WebhookPayload,
    ) -> Result<Payment, PaymentError> {
        let status = PaymentStatus::from_str(&payload.status)
            .map_err(|_| PaymentError::InvalidStatus(payload.status.clone()))?;

        let latest = self
            .payments
            .latest_for_order(payload.order_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if latest.payment_method != gateway {
            tracing::warn!(
                payment_id = %latest.id,
                recorded = %latest.payment_method,
                gateway = %gateway,
                "Webhook gateway differs from recorded payment method"
            );
        }
        if let Some(amount) = payload.amount
            && amount != latest.amount
        {
            tracing::warn!(payment_id = %latest.id, %amount, expected = %latest.amount, "Webhook amount mismatch");
        }

        let payment = self
            .payments
            .apply_webhook(
                latest.id,
                status,
                payload.transaction_id.as_deref(),
                WEBHOOK_RESPONSE,
            )
            .await?;

        self.mirror_onto_order(&payment).await?;
        Ok(payment)
    }

    async fn mirror_onto_order(&self, payment: &Payment) -> Result<(), PaymentError> {
        if let Some(order_status) = payment.status.order_payment_status() {
            self.orders
                .set_payment_status(payment.order_id, order_status)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn configured() -> PaymentConfig {
        PaymentConfig {
            stripe_secret_key: Some(SecretString::from("sk_test_abc")),
            bkash_app_key: Some(SecretString::from("bk_app_key")),
            ..PaymentConfig::default()
        }
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_charge_transaction_ids() {
        let config = configured();
        assert_eq!(
            charge(&config, PaymentMethod::Stripe, OrderId::new(42)).unwrap(),
            "stripe_txn_42"
        );
        assert_eq!(
            charge(&config, PaymentMethod::Bkash, OrderId::new(42)).unwrap(),
            "bkash_txn_42"
        );
    }

    #[test]
    fn test_charge_unconfigured() {
        let config = PaymentConfig::default();
        let err = charge(&config, PaymentMethod::Stripe, OrderId::new(1)).unwrap_err();
        assert_eq!(err.to_string(), "stripe not configured");

        let err = charge(&config, PaymentMethod::Bkash, OrderId::new(1)).unwrap_err();
        assert_eq!(err.to_string(), "bkash not configured");
    }

    #[test]
    fn test_signature_skipped_without_secret() {
        assert!(verify_webhook_signature(None, None, b"{}").is_ok());
    }

    #[test]
    fn test_signature_verified() {
        let secret = SecretString::from("whsec_test");
        let body = br#"{"order_id":1,"status":"completed"}"#;
        let signature = sign("whsec_test", body);

        assert!(verify_webhook_signature(Some(&secret), Some(&signature), body).is_ok());
    }

    #[test]
    fn test_signature_rejected() {
        let secret = SecretString::from("whsec_test");
        let body = br#"{"order_id":1,"status":"completed"}"#;
        let wrong_key = sign("other", body);

        for header in [None, Some("zz-not-hex"), Some(wrong_key.as_str())] {
            assert!(matches!(
                verify_webhook_signature(Some(&secret), header, body),
                Err(PaymentError::InvalidSignature)
            ));
        }
    }
}
