use reqwest::StatusCode;
use thiserror::Error;

use crate::net::FetchError;
use crate::worker::OFFLINE_BODY;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Gateway timeout - offline and not cached")]
    GatewayTimeout,

    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            504 => ApiError::GatewayTimeout,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether the failure means the data is unavailable offline rather
    /// than that the server rejected the request.
    pub fn is_offline(&self) -> bool {
        match self {
            ApiError::GatewayTimeout | ApiError::Network(FetchError::Offline) => true,
            ApiError::ServerError(body) => body == OFFLINE_BODY,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
            ApiError::NotFound(b) if b == "gone"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::GATEWAY_TIMEOUT, ""),
            ApiError::GatewayTimeout
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "down"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let msg = err.to_string();
        assert!(msg.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_offline_detection() {
        assert!(ApiError::GatewayTimeout.is_offline());
        assert!(ApiError::Network(FetchError::Offline).is_offline());
        assert!(ApiError::from_status(
            StatusCode::SERVICE_UNAVAILABLE,
            OFFLINE_BODY
        )
        .is_offline());
        assert!(!ApiError::NotFound(String::new()).is_offline());
    }
}
