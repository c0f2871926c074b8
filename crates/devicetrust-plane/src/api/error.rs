//! API error types and responses
//!
//! Only registration can fail visibly. Intent proof submission always
//! answers `{"verified": bool}` and never goes through this type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistrationError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing fields")]
    MissingFields,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Device already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "MISSING_FIELDS",
                "missing fields".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::AlreadyRegistered(device_id) => (
                StatusCode::CONFLICT,
                "ALREADY_REGISTERED",
                format!("Device '{}' is already registered", device_id),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::MissingFields => ApiError::MissingFields,
            RegistrationError::AlreadyRegistered(device_id) => ApiError::AlreadyRegistered(device_id),
            RegistrationError::Storage(e) => ApiError::Internal(format!("Storage error: {}", e)),
        }
    }
}
