//! Mock Checkout Provider
//!
//! Records every session request and answers payment-intent lookups from an
//! in-memory table. Used by tests and local development without Stripe keys.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::checkout::{CheckoutProvider, CheckoutRequest, CheckoutSession};
use crate::error::{PaymentError, Result};

/// In-memory checkout provider
#[derive(Default)]
pub struct MockCheckoutProvider {
    requests: Mutex<Vec<CheckoutRequest>>,
    intents: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MockCheckoutProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent session requests fail with a provider error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Answer lookups for `payment_intent` with `purchase_id`
    pub async fn link_payment_intent(&self, payment_intent: &str, purchase_id: &str) {
        self.intents
            .lock()
            .await
            .insert(payment_intent.to_string(), purchase_id.to_string());
    }

    /// Every session request received so far
    pub async fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CheckoutProvider for MockCheckoutProvider {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentError::Stripe("mock provider unavailable".into()));
        }

        let mut requests = self.requests.lock().await;
        let id = format!("cs_mock_{}", requests.len() + 1);
        requests.push(request);

        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.example.com/pay/{id}"),
            id,
        })
    }

    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<String>> {
        Ok(self.intents.lock().await.get(payment_intent).cloned())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
