//! Stripe Checkout Integration
//!
//! Hosted checkout for one-off course purchases. The purchase id travels as
//! `purchaseId` metadata on both the session and its payment intent so the
//! webhook can be correlated without a lookup table.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentIntentData, Currency, ListCheckoutSessions, PaymentIntentId,
};

use crate::error::{PaymentError, Result};

/// Metadata key carrying the purchase id
pub const PURCHASE_ID_METADATA_KEY: &str = "purchaseId";

/// Outbound hosted-checkout provider
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Open a hosted checkout session for one purchase
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;

    /// Purchase id stored on the session that owns `payment_intent`, if any
    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<String>>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Request to create a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Correlation id embedded as metadata
    pub purchase_id: String,

    /// Line item name (the course title)
    pub product_name: String,

    /// Charge in minor currency units
    pub unit_amount: i64,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    /// Customer email, when known
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id
    pub id: String,

    /// URL to redirect user to
    pub checkout_url: String,
}

/// Supported settlement currencies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutCurrency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl CheckoutCurrency {
    const fn to_stripe(self) -> Currency {
        match self {
            Self::Usd => Currency::USD,
            Self::Eur => Currency::EUR,
            Self::Gbp => Currency::GBP,
        }
    }
}

impl FromStr for CheckoutCurrency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Self::Usd),
            "eur" => Ok(Self::Eur),
            "gbp" => Ok(Self::Gbp),
            other => Err(PaymentError::Config(format!("Unsupported currency: {other}"))),
        }
    }
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: String,
    currency: CheckoutCurrency,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str, webhook_secret: &str, currency: CheckoutCurrency) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
            currency,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;
        let currency = std::env::var("CURRENCY")
            .ok()
            .map(|c| c.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self::new(&secret_key, &webhook_secret, currency))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    pub const fn currency(&self) -> CheckoutCurrency {
        self.currency
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let metadata: HashMap<String, String> = HashMap::from([(
            PURCHASE_ID_METADATA_KEY.to_string(),
            request.purchase_id.clone(),
        )]);

        let mut params = CreateCheckoutSession::new();
        params.customer_email = request.customer_email.as_deref();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);
        params.metadata = Some(metadata.clone());
        params.payment_intent_data = Some(CreateCheckoutSessionPaymentIntentData {
            metadata: Some(metadata),
            ..Default::default()
        });
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: self.currency.to_stripe(),
                unit_amount: Some(request.unit_amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: request.product_name.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        tracing::debug!(
            session_id = %session.id,
            purchase_id = %request.purchase_id,
            "Checkout session created"
        );

        Ok(CheckoutSession {
            id: session.id.to_string(),
            checkout_url,
        })
    }

    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<String>> {
        let intent_id: PaymentIntentId = payment_intent
            .parse()
            .map_err(|_| PaymentError::WebhookParse(format!("Invalid payment intent id: {payment_intent}")))?;

        let mut params = ListCheckoutSessions::new();
        params.payment_intent = Some(intent_id);
        params.limit = Some(1);

        let sessions = StripeCheckoutSession::list(&self.client, &params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        Ok(sessions.data.into_iter().next().and_then(|session| {
            session
                .metadata
                .and_then(|m| m.get(PURCHASE_ID_METADATA_KEY).cloned())
        }))
    }

    fn name(&self) -> &'static str {
        "stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<CheckoutCurrency>().unwrap(), CheckoutCurrency::Usd);
        assert_eq!(" EUR ".parse::<CheckoutCurrency>().unwrap(), CheckoutCurrency::Eur);
        assert!("jpy".parse::<CheckoutCurrency>().is_err());
    }

    #[test]
    fn test_default_currency_is_usd() {
        let client = StripeClient::new("sk_test_x", "whsec_x", CheckoutCurrency::default());
        assert_eq!(client.currency(), CheckoutCurrency::Usd);
        assert_eq!(client.webhook_secret(), "whsec_x");
    }
}
