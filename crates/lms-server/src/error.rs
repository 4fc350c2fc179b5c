//! Request-Boundary Errors
//!
//! Every failure leaves the server as `{ "success": false, "message", "code" }`
//! with a status the caller (or a webhook sender's retry logic) can act on.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lms_core::LmsError;
use lms_payments::PaymentError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
}

/// An error ready to be rendered as a response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// A collaborator that was never configured
    pub fn unavailable(message: &str, code: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn bad_request(message: &str, code: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    #[cfg(test)]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl From<LmsError> for ApiError {
    fn from(err: LmsError) -> Self {
        let (status, code) = match &err {
            LmsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            LmsError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            LmsError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            LmsError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            LmsError::AlreadyPurchased => (StatusCode::CONFLICT, "ALREADY_PURCHASED"),
            LmsError::UnverifiedEvent(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            LmsError::Upstream(_) => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_ERROR"),
            LmsError::Storage(_) | LmsError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        Self::new(status, code, err.user_message()).with_detail(err.to_string())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let (status, code) = match err {
            PaymentError::Core(inner) => return inner.into(),
            PaymentError::Stripe(_) => (StatusCode::BAD_GATEWAY, "CHECKOUT_ERROR"),
            PaymentError::UnverifiedEvent(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            PaymentError::WebhookParse(_) => (StatusCode::BAD_REQUEST, "MALFORMED_EVENT"),
            PaymentError::CorrelationMissing { .. } => {
                (StatusCode::BAD_REQUEST, "MISSING_PURCHASE_ID")
            }
            PaymentError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "PAYMENTS_DISABLED"),
        };
        Self::new(status, code, err.user_message()).with_detail(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.detail.as_deref().unwrap_or(&self.message);
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, "{}", detail);
        } else {
            tracing::debug!(status = %self.status, code = self.code, "{}", detail);
        }

        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
                code: self.code,
            }),
        )
            .into_response()
    }
}
