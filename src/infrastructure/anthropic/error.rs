use thiserror::Error;

/// Errors that can occur when interacting with the Messages API
#[derive(Error, Debug)]
pub enum ModelApiError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry after waiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// API server encountered an internal error
    #[error("API server error: {0}")]
    ServerError(String),

    /// API server is overloaded, retry later
    #[error("API server overloaded")]
    Overloaded,

    /// Network error occurred during request
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error
    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out waiting for response
    #[error("Timeout waiting for response")]
    Timeout,
}

impl ModelApiError {
    /// Returns true if this error is transient and should be retried.
    ///
    /// Transient: rate limits, 5xx, overload, timeouts, network errors.
    /// Permanent: auth failures, invalid requests, serialization errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Overloaded | Self::Timeout => {
                true
            }
            Self::NetworkError(e) => !e.is_builder(),
            Self::InvalidRequest(_)
            | Self::AuthenticationFailed(_)
            | Self::SerializationError(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ModelApiError::RateLimitExceeded.is_transient());
        assert!(ModelApiError::Overloaded.is_transient());
        assert!(ModelApiError::Timeout.is_transient());
        assert!(ModelApiError::ServerError("500".to_string()).is_transient());
        assert!(!ModelApiError::AuthenticationFailed("bad key".to_string()).is_transient());
        assert!(!ModelApiError::InvalidRequest("empty".to_string()).is_transient());
    }
}
