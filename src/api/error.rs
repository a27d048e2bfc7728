//! Error types for REST calls.

use thiserror::Error;

/// Errors that can occur talking to the office REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Credential missing, expired or rejected (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server returned an error response (4xx, 5xx).
    #[error("Server error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response body doesn't match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be built.
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Classify a transport-level reqwest failure.
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(timeout_ms)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Whether a retry later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            ApiError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApiError::Timeout(5000).to_string(),
            "Request timeout after 5000ms"
        );
        assert_eq!(
            ApiError::Upstream {
                status: 400,
                message: "desk already booked".to_string()
            }
            .to_string(),
            "Server error 400: desk already booked"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Network("refused".to_string()).is_transient());
        assert!(ApiError::Timeout(10).is_transient());
        assert!(ApiError::Upstream {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::Upstream {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!ApiError::Unauthorized("bad token".to_string()).is_transient());
    }
}
