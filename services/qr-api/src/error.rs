use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure kinds of the request pipeline
///
/// Every failure while generating a QR code is one of these three kinds.
/// The enum implements [`IntoResponse`] so handlers can return it directly;
/// the HTTP status follows from the kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QrError {
    /// Input is not an absolute http(s) URL. Client fault.
    #[error("{0}")]
    Validation(String),

    /// Input is valid but cannot be rendered, e.g. it exceeds QR capacity. Client fault.
    #[error("Error generating QR code: {0}")]
    Encoding(String),

    /// The object store rejected or never received the upload. Server fault.
    #[error("Failed to upload to S3: {0}")]
    Storage(String),
}

impl QrError {
    /// HTTP status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            QrError::Validation(_) | QrError::Encoding(_) => StatusCode::BAD_REQUEST,
            QrError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Underlying cause without the kind prefix
    pub fn cause(&self) -> &str {
        match self {
            QrError::Validation(cause) | QrError::Encoding(cause) | QrError::Storage(cause) => {
                cause
            }
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            QrError::Validation(_) => "validation",
            QrError::Encoding(_) => "encoding",
            QrError::Storage(_) => "storage",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for QrError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
