//! Error Types

use thiserror::Error;

/// Result type alias for LMS operations
pub type Result<T> = std::result::Result<T, LmsError>;

/// Domain error taxonomy shared by every crate in the workspace
#[derive(Error, Debug)]
pub enum LmsError {
    /// Referenced entity is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unresolvable credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credential present but insufficient
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed id, out-of-range value, missing field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A completed purchase already exists for this user and course
    #[error("Course already purchased")]
    AlreadyPurchased,

    /// Signed callback failed verification
    #[error("Unverified event: {0}")]
    UnverifiedEvent(String),

    /// External provider unreachable or misconfigured
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Document store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LmsError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Storage(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(_) => "Unauthorized access".into(),
            Self::Forbidden(msg) | Self::InvalidInput(msg) => msg.clone(),
            Self::AlreadyPurchased => "Course already purchased".into(),
            Self::UnverifiedEvent(_) => "Event signature could not be verified".into(),
            Self::Upstream(_) => "An external service is unavailable. Please try again.".into(),
            Self::Storage(_) | Self::Json(_) => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LmsError::Storage("timeout".into()).is_retryable());
        assert!(LmsError::Upstream("503".into()).is_retryable());
        assert!(!LmsError::AlreadyPurchased.is_retryable());
        assert!(!LmsError::NotFound("Course".into()).is_retryable());
    }

    #[test]
    fn test_user_message_names_missing_entity() {
        assert_eq!(LmsError::NotFound("Course".into()).user_message(), "Course not found");
    }
}
