//! Error types for the grocer-baas crate

use thiserror::Error;

/// Result type alias using `BaasError`
pub type Result<T> = std::result::Result<T, BaasError>;

/// Errors returned by the platform collaborator
#[derive(Error, Debug)]
pub enum BaasError {
    /// Username or password rejected
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Session token unknown or expired
    #[error("invalid session token")]
    SessionInvalid,

    /// File payload rejected before storage
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Error reported by the platform API
    #[error("platform error {code}: {message}")]
    Api { code: i64, message: String },

    /// Response could not be understood
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Timeout error
    #[error("operation timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// HTTP error
    #[error("http error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BaasError {
    /// Map a platform `{code, error}` body to an error
    pub fn from_api(code: i64, message: impl Into<String>) -> Self {
        match code {
            // 210: password mismatch, 211: user not found
            210 | 211 => Self::InvalidCredentials,
            _ => Self::Api {
                code,
                message: message.into(),
            },
        }
    }

    /// Whether the failure is the caller's credentials rather than the platform
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::SessionInvalid)
    }
}

/// Timeouts are mapped by `RestClient`, which knows the deadline
impl From<reqwest::Error> for BaasError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            BaasError::Connection(err.to_string())
        } else if err.is_decode() {
            BaasError::InvalidResponse(err.to_string())
        } else {
            BaasError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BaasError {
    fn from(err: serde_json::Error) -> Self {
        BaasError::InvalidResponse(err.to_string())
    }
}
