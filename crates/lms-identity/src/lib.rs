//! # lms-identity
//!
//! Identity providers and user lifecycle webhooks.
//!
//! ## Providers
//!
//! - **Clerk** (default): session verification and role metadata via the
//!   Clerk backend API
//! - **Mock**: in-memory tokens for tests and local development
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lms_identity::{ClerkProvider, UserLifecycleHandler, WebhookVerifier};
//!
//! let identity: Arc<dyn IdentityProvider> = Arc::new(ClerkProvider::from_env()?);
//! let user_id = identity.authenticate(bearer).await?;
//!
//! let verifier = WebhookVerifier::new(&secret)?;
//! verifier.verify(headers, &body)?;
//! UserLifecycleHandler::new(store).handle(&body).await?;
//! ```

#[cfg(feature = "clerk")]
pub mod clerk;
pub mod mock;
pub mod webhook;

#[cfg(feature = "clerk")]
pub use clerk::{ClerkConfig, ClerkProvider};
pub use mock::MockIdentityProvider;
pub use webhook::{
    LifecycleOutcome, UserLifecycleHandler, WEBHOOK_TOLERANCE_SECS, WebhookHeaders,
    WebhookVerifier,
};

// Re-export core types for convenience
pub use lms_core::{IdentityProvider, LmsError, Result, Role, UserId};
