//! LMS HTTP Server
//!
//! Axum-based server providing the course, student and educator REST API
//! plus the identity and payment provider webhooks.

mod auth;
mod config;
mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_core::{IdentityProvider, MemoryStore};
use lms_identity::{ClerkProvider, WebhookVerifier};
use lms_payments::{PurchaseReconciler, StripeClient};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    let store = Arc::new(MemoryStore::new());

    // Identity provider
    let identity: Option<Arc<dyn IdentityProvider>> = match ClerkProvider::from_env() {
        Ok(provider) => {
            if provider.health_check().await.unwrap_or(false) {
                tracing::info!("✓ Connected to Clerk");
            } else {
                tracing::warn!("⚠ Clerk configured but not reachable");
            }
            Some(Arc::new(provider))
        }
        Err(e) => {
            tracing::warn!("⚠ Identity provider not configured - protected routes disabled");
            tracing::warn!("  {}", e);
            None
        }
    };

    let clerk_webhook = match config.clerk_webhook_secret.as_deref().map(WebhookVerifier::new) {
        Some(Ok(verifier)) => Some(verifier),
        Some(Err(e)) => {
            tracing::warn!("⚠ CLERK_WEBHOOK_SECRET rejected: {}", e);
            None
        }
        None => {
            tracing::warn!("⚠ CLERK_WEBHOOK_SECRET not set - user sync disabled");
            None
        }
    };

    // Payments
    let reconciler = match StripeClient::from_env() {
        Ok(stripe) => {
            tracing::info!(currency = ?stripe.currency(), "✓ Stripe configured");
            let secret = stripe.webhook_secret().to_string();
            Some(Arc::new(PurchaseReconciler::new(
                store.clone(),
                Arc::new(stripe),
                secret,
            )))
        }
        Err(e) => {
            tracing::warn!("⚠ Stripe not configured - payments disabled");
            tracing::warn!("  {}", e);
            None
        }
    };

    // Build application state
    let state = AppState {
        store,
        identity,
        reconciler,
        clerk_webhook,
        config: Arc::new(config.clone()),
    };

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 LMS server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /clerk                   - Identity webhook");
    tracing::info!("  POST /stripe                  - Payment webhook");
    tracing::info!("  GET  /api/course/all          - Published courses");
    tracing::info!("  POST /api/user/purchase       - Start checkout");
    tracing::info!("  GET  /api/educator/dashboard  - Educator dashboard");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
