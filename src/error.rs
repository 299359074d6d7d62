//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// SQLSTATE raised by Postgres when `statement_timeout` cancels a query
const QUERY_CANCELED: &str = "57014";

/// Machine-readable error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    Conflict,
    StorageUnavailable,
    InternalError,
}

/// A single rejected field of a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("A book with this ISBN already exists".to_string())
            }
            sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
                AppError::StorageUnavailable(e.to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::StorageUnavailable(e.to_string()),
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

/// Error response body, shared by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    /// Short fixed description of the error kind
    pub error: String,
    /// Human-readable detail
    pub message: String,
    /// Offending fields, only for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn to_body(&self) -> ErrorResponse {
        let (code, error, message, errors) = match self {
            AppError::Validation(fields) => (
                ErrorCode::ValidationError,
                "validation failed",
                "The request body contains invalid fields".to_string(),
                fields.clone(),
            ),
            AppError::BadRequest(msg) => (ErrorCode::BadRequest, "bad request", msg.clone(), vec![]),
            AppError::NotFound(msg) => (ErrorCode::NotFound, "not found", msg.clone(), vec![]),
            AppError::MethodNotAllowed(msg) => (
                ErrorCode::MethodNotAllowed,
                "method not allowed",
                msg.clone(),
                vec![],
            ),
            AppError::Conflict(msg) => (ErrorCode::Conflict, "isbn exists", msg.clone(), vec![]),
            AppError::StorageUnavailable(_) => (
                ErrorCode::StorageUnavailable,
                "storage unavailable",
                "The database could not be reached".to_string(),
                vec![],
            ),
            AppError::Internal(_) => (
                ErrorCode::InternalError,
                "internal error",
                "Internal server error".to_string(),
                vec![],
            ),
        };

        ErrorResponse {
            code,
            error: error.to_string(),
            message,
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::StorageUnavailable(cause) => {
                tracing::error!(cause = %cause, "Storage unavailable");
            }
            AppError::Internal(cause) => {
                tracing::error!(cause = %cause, "Internal error");
            }
            _ => {}
        }

        (self.status(), Json(self.to_body())).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
