//! HTTP Handlers

pub mod course;
pub mod educator;
pub mod user;
pub mod webhooks;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Success envelope: `{ "success": true, ...body }`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,

    #[serde(flatten)]
    pub body: T,
}

pub const fn success<T>(body: T) -> Json<Success<T>> {
    Json(Success { success: true, body })
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub identity_connected: bool,
    pub payments_configured: bool,
    pub identity_webhook_configured: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let identity_connected = match &state.identity {
        Some(identity) => identity.health_check().await.unwrap_or(false),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        identity_connected,
        payments_configured: state.reconciler.is_some(),
        identity_webhook_configured: state.clerk_webhook.is_some(),
    })
}
