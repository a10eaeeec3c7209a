//! Error handling for the inventory analytics server
//!
//! Every failure reaches the caller as `{"error": message, "is_error": true}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // ERP errors
    #[error("Failed to reach Odoo: {0}")]
    Gateway(String),

    #[error("Odoo authentication failed: {0}")]
    Authentication(String),

    #[error("Odoo error: {0}")]
    RemoteFault(String),

    // Caller errors
    #[error("{0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Gateway(_) | AppError::RemoteFault(_) => StatusCode::BAD_GATEWAY,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownTool(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error payload shared by the HTTP and stdio transports
    pub fn to_payload(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            is_error: true,
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub is_error: bool,
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Gateway(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(self.to_payload())).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message() {
        let err = AppError::UnknownTool("frobnicate".into());
        assert_eq!(err.to_string(), "Unknown tool: frobnicate");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_payload_shape() {
        let payload = AppError::Validation("Target date must be in the future".into()).to_payload();
        let json = serde_json::to_value(payload).unwrap();
        assert_eq!(json["error"], "Target date must be in the future");
        assert_eq!(json["is_error"], true);
    }
}
