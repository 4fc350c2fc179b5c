//! Payment Error Types

use lms_core::LmsError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    UnverifiedEvent(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Verified event carries no purchase id
    #[error("Event {event_id} carries no purchase id")]
    CorrelationMissing { event_id: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain or storage error
    #[error(transparent)]
    Core(#[from] LmsError),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Stripe(_) => true,
            Self::Core(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Stripe(_) => "Payment processing failed. Please try again.".into(),
            Self::UnverifiedEvent(_) => "Invalid signature".into(),
            Self::WebhookParse(_) => "Malformed event".into(),
            Self::CorrelationMissing { .. } => "Missing purchaseId".into(),
            Self::Config(_) => "Payment configuration error.".into(),
            Self::Core(err) => err.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failures_are_retryable() {
        assert!(PaymentError::Core(LmsError::Storage("down".into())).is_retryable());
        assert!(PaymentError::Stripe("503".into()).is_retryable());
        assert!(!PaymentError::UnverifiedEvent("bad".into()).is_retryable());
        assert!(!PaymentError::CorrelationMissing { event_id: "evt_1".into() }.is_retryable());
        assert!(!PaymentError::Core(LmsError::NotFound("Purchase".into())).is_retryable());
    }
}
