//! Webhook Handlers
//!
//! Both endpoints take the body as an unparsed string; signatures are
//! computed over the exact bytes received.

use axum::{Json, extract::State, http::HeaderMap};
use lms_identity::WebhookHeaders;
use lms_payments::CallbackOutcome;
use serde::Serialize;

use super::{Success, success};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReceivedBody {
    pub received: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Identity provider user lifecycle events
pub async fn clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Success<ReceivedBody>>, ApiError> {
    let verifier = state
        .clerk_webhook
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("Identity webhook not configured", "WEBHOOK_DISABLED"))?;

    let (Some(id), Some(timestamp), Some(signature)) = (
        header(&headers, "svix-id"),
        header(&headers, "svix-timestamp"),
        header(&headers, "svix-signature"),
    ) else {
        tracing::warn!("Identity webhook missing signature headers");
        return Err(ApiError::bad_request("Missing svix headers", "MISSING_SIGNATURE"));
    };

    if let Err(e) = verifier.verify(WebhookHeaders { id, timestamp, signature }, &body) {
        tracing::warn!(svix_id = %id, error = %e, "Identity webhook signature failed");
        return Err(e.into());
    }

    state.lifecycle().handle(&body).await?;
    Ok(success(ReceivedBody { received: true }))
}

/// Payment provider events
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Success<ReceivedBody>>, ApiError> {
    let reconciler = state.reconciler()?;

    let signature = header(&headers, "stripe-signature").ok_or_else(|| {
        tracing::warn!("Payment webhook missing signature header");
        ApiError::bad_request("Missing Stripe signature", "MISSING_SIGNATURE")
    })?;

    let outcome = reconciler.apply_payment_callback(&body, signature).await?;
    if let CallbackOutcome::Applied { purchase_id, status } = outcome {
        tracing::info!(purchase_id = %purchase_id, status = %status, "Payment webhook applied");
    }

    Ok(success(ReceivedBody { received: true }))
}
