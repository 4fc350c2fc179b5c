//! Client Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with `success: false` or a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }

    /// Message suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Http(_) => "Could not reach the server".into(),
            Self::Decode(_) => "Unexpected response from the server".into(),
        }
    }
}
