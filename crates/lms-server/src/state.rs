//! Application State

use std::sync::Arc;

use lms_core::{
    Catalog, Dashboard, IdentityProvider, LmsError, MemoryStore, ProgressTracker, User, UserId,
    UserStore,
};
use lms_identity::{UserLifecycleHandler, WebhookVerifier};
use lms_payments::PurchaseReconciler;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Document store
    pub store: Arc<MemoryStore>,

    /// Identity provider (optional - None if not configured)
    pub identity: Option<Arc<dyn IdentityProvider>>,

    /// Purchase reconciler (optional - None if Stripe is not configured)
    pub reconciler: Option<Arc<PurchaseReconciler<MemoryStore>>>,

    /// Identity webhook verifier (optional - None if no secret is set)
    pub clerk_webhook: Option<WebhookVerifier>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn identity(&self) -> Result<&Arc<dyn IdentityProvider>, ApiError> {
        self.identity
            .as_ref()
            .ok_or_else(|| ApiError::unavailable("Authentication not configured", "AUTH_DISABLED"))
    }

    pub fn reconciler(&self) -> Result<&PurchaseReconciler<MemoryStore>, ApiError> {
        self.reconciler
            .as_deref()
            .ok_or_else(|| ApiError::unavailable("Payments not configured", "PAYMENTS_DISABLED"))
    }

    pub fn catalog(&self) -> Catalog<MemoryStore> {
        Catalog::new(self.store.clone())
    }

    pub fn progress(&self) -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(self.store.clone())
    }

    pub fn dashboard(&self) -> Dashboard<MemoryStore> {
        Dashboard::new(self.store.clone())
    }

    pub fn lifecycle(&self) -> UserLifecycleHandler<MemoryStore> {
        UserLifecycleHandler::new(self.store.clone())
    }

    /// Stored record of an authenticated user
    pub async fn user(&self, user_id: &UserId) -> Result<User, ApiError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("User".into()).into())
    }
}
