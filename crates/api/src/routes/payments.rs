//! Payments and gateway webhooks.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde_json::{Value, json};
use tracing::instrument;

use bazaar_core::{PaymentId, PaymentMethod};

use super::parse_id;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CreatePaymentRequest, Payment, WebhookPayload};
use crate::response::{self, Envelope};
use crate::services::PaymentService;
use crate::services::payments::verify_webhook_signature;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the webhook body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// POST /api/v1/payments
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Envelope<Payment>> {
    let Json(req) = body?;
    let payment = PaymentService::new(state.pool(), &state.config().payment)
        .create_payment(user.id, &req)
        .await?;
    Ok(response::created("Payment initiated", payment))
}

/// GET /api/v1/payments/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Envelope<Payment>> {
    let id: PaymentId = parse_id(&id, "payment")?;
    let payment = PaymentService::new(state.pool(), &state.config().payment)
        .get_payment(user.id, id)
        .await?;
    Ok(response::ok("Payment retrieved successfully", payment))
}

/// POST /api/v1/payments/webhook/stripe
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    webhook(&state, PaymentMethod::Stripe, &headers, &body).await
}

/// POST /api/v1/payments/webhook/bkash
pub async fn bkash_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    webhook(&state, PaymentMethod::Bkash, &headers, &body).await
}

#[instrument(skip(state, headers, body))]
async fn webhook(
    state: &AppState,
    gateway: PaymentMethod,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<Value>> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    verify_webhook_signature(
        state.config().payment.webhook_secret.as_ref(),
        signature,
        body,
    )?;

    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

    PaymentService::new(state.pool(), &state.config().payment)
        .handle_webhook(gateway, &payload)
        .await?;

    Ok(Json(json!({ "status": "success" })))
}
