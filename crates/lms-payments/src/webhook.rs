//! Stripe Webhook Events
//!
//! Parses the verified raw body into the handful of events that move a
//! purchase. Everything else is `Other` and acknowledged without action.

use std::collections::HashMap;

use lms_core::PaymentOutcome;
use serde::Deserialize;

use crate::checkout::PURCHASE_ID_METADATA_KEY;
use crate::error::{PaymentError, Result};

/// Where the purchase id for an event comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Correlation {
    /// `purchaseId` metadata present on the event object
    PurchaseId(String),

    /// Only a payment intent id; resolve through the checkout provider
    PaymentIntent(String),

    /// Nothing to correlate with
    Missing,
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Payment settled or failed for a purchase
    Settled {
        event_id: String,
        event_type: String,
        outcome: PaymentOutcome,
        correlation: Correlation,
    },

    /// Checkout finished but the payment has not cleared yet
    AwaitingPayment { event_id: String, session_id: String },

    /// Unhandled event type
    Other { event_id: String, event_type: String },
}

impl PaymentEvent {
    pub fn event_id(&self) -> &str {
        match self {
            Self::Settled { event_id, .. }
            | Self::AwaitingPayment { event_id, .. }
            | Self::Other { event_id, .. } => event_id,
        }
    }

    /// Parse a raw event body
    pub fn parse(payload: &str) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_str(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;
        let object = envelope.data.object;

        let settled = |outcome| Self::Settled {
            event_id: envelope.id.clone(),
            event_type: envelope.type_.clone(),
            outcome,
            correlation: object.correlation(),
        };

        let event = match envelope.type_.as_str() {
            "checkout.session.completed" if object.payment_status.as_deref() == Some("unpaid") => {
                Self::AwaitingPayment {
                    event_id: envelope.id.clone(),
                    session_id: object.id.clone().unwrap_or_default(),
                }
            }
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                settled(PaymentOutcome::Succeeded)
            }
            "checkout.session.async_payment_failed" | "payment_intent.payment_failed" => {
                settled(PaymentOutcome::Failed)
            }
            _ => Self::Other {
                event_id: envelope.id.clone(),
                event_type: envelope.type_.clone(),
            },
        };
        Ok(event)
    }
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: EventObject,
}

/// The fields we read from either a checkout session or a payment intent
#[derive(Deserialize)]
struct EventObject {
    id: Option<String>,
    object: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
    payment_status: Option<String>,
    payment_intent: Option<String>,
}

impl EventObject {
    fn correlation(&self) -> Correlation {
        if let Some(purchase_id) = self
            .metadata
            .as_ref()
            .and_then(|m| m.get(PURCHASE_ID_METADATA_KEY))
            .filter(|id| !id.is_empty())
        {
            return Correlation::PurchaseId(purchase_id.clone());
        }

        let intent = match self.object.as_deref() {
            Some("payment_intent") => self.id.clone(),
            _ => self.payment_intent.clone(),
        };
        intent.map_or(Correlation::Missing, Correlation::PaymentIntent)
    }
}
