use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("Logged in, but the session could not be saved")]
    SessionNotSaved,

    #[error(transparent)]
    Validation(#[from] ValidationError),
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

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Login maps every non-2xx status to an authentication failure
    pub fn authentication(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Authentication(format!("Status {}: {}", status, Self::truncate_body(body)))
    }

    /// Transport-level failure (connection, timeout, non-2xx, bad body)
    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Authentication(_)
            | ApiError::Unauthorized
            | ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::ServerError(_)
            | ApiError::Network(_)
            | ApiError::InvalidResponse(_) => true,
            ApiError::Encode(_) | ApiError::SessionNotSaved | ApiError::Validation(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
