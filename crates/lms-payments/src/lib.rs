//! # lms-payments
//!
//! Course checkout and purchase reconciliation.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  initiate   ┌─────────────────┐  redirect  ┌─────────────┐
//! │   Student   │────────────▶│  Stripe Hosted  │───────────▶│  Frontend   │
//! │  (browser)  │             │  Checkout Page  │            │ /my-enroll… │
//! └─────────────┘             └────────┬────────┘            └─────────────┘
//!                                      │ signed webhook
//!                             ┌────────▼────────┐
//!                             │   Reconciler    │── purchase, user, course
//!                             └─────────────────┘
//! ```
//!
//! The purchase is created `pending` before the session opens and only the
//! signed webhook moves it on. The browser polls enrollment to observe the
//! result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lms_payments::{PurchaseReconciler, StripeClient};
//!
//! let stripe = Arc::new(StripeClient::from_env()?);
//! let secret = stripe.webhook_secret().to_string();
//! let reconciler = PurchaseReconciler::new(store, stripe, secret);
//!
//! let started = reconciler.initiate_purchase(&user_id, &course_id, origin).await?;
//! // Redirect user to: started.session_url
//! ```

mod checkout;
mod error;
mod mock;
mod reconcile;
mod signature;
mod webhook;

pub use checkout::{
    CheckoutCurrency, CheckoutProvider, CheckoutRequest, CheckoutSession, PURCHASE_ID_METADATA_KEY,
    StripeClient,
};
pub use error::{PaymentError, Result};
pub use mock::MockCheckoutProvider;
pub use reconcile::{CallbackOutcome, CheckoutStarted, PurchaseReconciler, RedirectUrls};
pub use signature::{DEFAULT_TOLERANCE_SECS, sign_payload, verify_signature, verify_signature_at};
pub use webhook::{Correlation, PaymentEvent};
