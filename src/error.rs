use std::collections::HashMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

use crate::managers::ManagerError;

/// "Client closed request": the request was cancelled before the collaborator finished.
pub const REQUEST_CANCELLED_STATUS: u16 = 499;

/// Errors surfaced to HTTP clients. Unauthenticated callers get `Forbidden`
/// too; the API never answers 401.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Validation {
        message: String,
        fields: HashMap<String, String>,
    },
    #[error("{0}")]
    InvalidJson(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Cancelled(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Single-field validation failure, e.g. a route id that disagrees with the body id.
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: "Invalid request".to_string(),
            fields: HashMap::from([(field.into(), message.into())]),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    fn kind(&self) -> (u16, &'static str) {
        match self {
            Self::BadRequest(_) => (400, "BAD_REQUEST"),
            Self::Validation { .. } => (400, "VALIDATION_ERROR"),
            Self::InvalidJson(_) => (400, "INVALID_JSON"),
            Self::Forbidden(_) => (403, "FORBIDDEN"),
            Self::NotFound(_) => (404, "NOT_FOUND"),
            Self::Cancelled(_) => (REQUEST_CANCELLED_STATUS, "REQUEST_CANCELLED"),
            Self::Internal(_) => (500, "INTERNAL_SERVER_ERROR"),
            Self::Unavailable(_) => (503, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().0
    }

    pub fn error_code(&self) -> &'static str {
        self.kind().1
    }

    /// `{"error": true, "message": ..., "code": ...}`, plus `field_errors` for validation failures.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.to_string(),
            "code": self.error_code(),
        });
        if let Self::Validation { fields, .. } = self {
            body["field_errors"] = json!(fields);
        }
        body
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotFound(msg) => Self::not_found(msg),
            ManagerError::Cancelled => Self::cancelled("Request was cancelled"),
            ManagerError::Conflict(msg) => {
                // Only conflicts the dispatcher could not attribute to a deletion get here.
                tracing::error!("Unresolved concurrency conflict: {}", msg);
                Self::internal_server_error("The record was modified by another request")
            }
            ManagerError::Database(
                e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
            ) => {
                tracing::error!("Database unavailable: {}", e);
                Self::service_unavailable("Database temporarily unavailable")
            }
            ManagerError::Database(e) => {
                tracing::error!("SQLx error: {}", e);
                Self::internal_server_error("Database error occurred")
            }
            ManagerError::Serialization(e) => {
                tracing::error!("Stored record could not be decoded: {}", e);
                Self::internal_server_error("Stored record could not be read")
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::invalid_json(rejection.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
