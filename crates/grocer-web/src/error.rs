//! Error types and the pending-error carrier

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grocer_baas::BaasError;
use thiserror::Error;

/// An error on its way to the error responder
///
/// Handlers never render errors themselves: the error is attached to an
/// otherwise empty response and `middleware::error_responder` renders it.
#[derive(Clone, Debug)]
pub struct PendingError {
    /// Human-readable message, safe to show in production
    pub message: String,
    /// Status classification; absent means 500
    pub status: Option<StatusCode>,
    /// Full diagnostic detail, only shown in development
    pub detail: String,
}

impl PendingError {
    /// Create an unclassified error
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            detail: message.clone(),
            message,
            status: None,
        }
    }

    /// Set the status classification
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the diagnostic detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Resolved status code
    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for PendingError {
    fn into_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    /// Upload stream or body problem; `reason` stays in the detail
    #[error("Upload failed")]
    Upload { status: StatusCode, reason: String },

    #[error("Only one file may be uploaded per request")]
    TooManyFiles,

    #[error("No file was uploaded")]
    MissingFile,

    /// Platform failure; the platform's own text stays in the detail
    #[error("Platform request failed")]
    Baas(#[from] BaasError),

    #[error("Internal Server Error")]
    Internal(String),
}

impl ApiError {
    /// The request carried no usable multipart body
    pub fn upload_unavailable(reason: impl Into<String>) -> Self {
        Self::Upload {
            status: StatusCode::BAD_GATEWAY,
            reason: reason.into(),
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::TooManyFiles | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upload { status, .. } => *status,
            Self::Baas(BaasError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Baas(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&ApiError> for PendingError {
    fn from(err: &ApiError) -> Self {
        PendingError::new(err.to_string())
            .with_status(err.status_code())
            .with_detail(format!("{:?}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        PendingError::from(&self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_500() {
        assert_eq!(PendingError::new("boom").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            PendingError::new("gone").with_status(StatusCode::NOT_FOUND).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_not_found_message() {
        let pending = PendingError::from(&ApiError::NotFound);
        assert_eq!(pending.message, "Not Found");
        assert_eq!(pending.status, Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_platform_status_mapping() {
        assert_eq!(
            ApiError::Baas(BaasError::Timeout { millis: 10 }).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Baas(BaasError::Http("down".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::upload_unavailable("x").status_code(), StatusCode::BAD_GATEWAY);
        let too_large = ApiError::Upload {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".into(),
        };
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_into_response_carries_pending_error() {
        let response = ApiError::MissingFile.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let pending = response.extensions().get::<PendingError>().unwrap();
        assert_eq!(pending.message, "No file was uploaded");
        assert!(pending.detail.contains("MissingFile"));
    }

    #[test]
    fn test_platform_text_only_in_detail() {
        let err = ApiError::Baas(BaasError::Http(
            "HTTP 500: java.lang.NullPointerException at Storage.put".into(),
        ));
        let pending = PendingError::from(&err);
        assert_eq!(pending.message, "Platform request failed");
        assert!(!pending.message.contains("NullPointerException"));
        assert!(pending.detail.contains("NullPointerException"));
    }
}
