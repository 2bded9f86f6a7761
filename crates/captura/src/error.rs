//! Error types for the capture pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Capture pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed request parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Required input artifact absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Output artifact already exists (duplicate invocation)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wrong extension or document format
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Missing required column/key, or empty table
    #[error("Validation error: {0}")]
    Validation(String),

    /// No JSON object recoverable from the model response
    #[error("Extraction failure: {0}")]
    ExtractionFailure(String),

    /// External collaborator call failed (extraction service or model)
    #[error("Service error: {0}")]
    Service(String),

    /// Database connection failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database statement failure; the transaction was rolled back first
    #[error("Database error: {0}")]
    Database(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_parameter", msg.clone())
            }
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            Error::UnsupportedType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_type",
                msg.clone(),
            ),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::ExtractionFailure(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "extraction_failure",
                msg.clone(),
            ),
            Error::Service(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "service_error", msg.clone())
            }
            Error::StoreUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "store_unavailable", msg.clone())
            }
            Error::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", msg.clone())
            }
            Error::Pdf(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "pdf_error", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Csv(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "csv_error",
                err.to_string(),
            ),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_pipeline_contract() {
        let cases = [
            (Error::InvalidParameter("p".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("f".into()), StatusCode::NOT_FOUND),
            (Error::Conflict("f".into()), StatusCode::CONFLICT),
            (
                Error::UnsupportedType("f".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (Error::Validation("c".into()), StatusCode::BAD_REQUEST),
            (
                Error::ExtractionFailure("m".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::StoreUnavailable("db".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                Error::Database("db".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
