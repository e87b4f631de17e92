//! Remote API error types.

use thiserror::Error;

/// Errors returned by a [`DbaasApi`](super::DbaasApi) call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("HTTP request failed: {message}")]
    Http { message: String, timeout: bool },

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The database does not exist.
    #[error("Database '{0}' not found")]
    NotFound(String),

    /// The response body could not be parsed.
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Whether the failure is likely to go away on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { .. } => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::NotFound(_) | ApiError::Decode(_) | ApiError::InvalidEndpoint(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Http {
            timeout: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Http {
            message: "connection reset".into(),
            timeout: false
        }
        .is_retryable());
        assert!(ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::NotFound("abc".into()).is_retryable());
    }
}
