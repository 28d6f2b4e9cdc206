use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The backend answered with an envelope whose code is not the success code.
    #[error("{message} (code {code})")]
    Business { code: i64, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map an HTTP error status and its extracted message to an error.
    pub fn from_status(status: u16, message: &str) -> Self {
        let truncated = Self::truncate_body(message);
        match status {
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            _ => ApiError::Http {
                status,
                message: truncated,
            },
        }
    }

    /// True when the failure means the session is no longer valid (401/403).
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) | ApiError::AccessDenied(_) => true,
            ApiError::Business { code, .. } => is_auth_code(*code),
            _ => false,
        }
    }
}

/// Codes that reset the session, whether they arrive as an HTTP status or an envelope code.
pub fn is_auth_code(code: i64) -> bool {
    code == 401 || code == 403
}
