//! Error types for Pedidos
//!
//! Provides the error handling system shared by every handler:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping (including the login/home redirects)
//! - Structured error responses
//! - Error codes for client handling

use crate::redirect;
use axum::{
    extract::rejection::FormRejection,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Header carrying the error code on redirect responses
pub const ERROR_CODE_HEADER: &str = "x-error-code";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Authentication errors (2xxx)
    Unauthenticated,
    ExpiredSession,

    // Authorization errors (3xxx)
    WrongRole,
    Forbidden,

    // Resource errors (4xxx)
    ItemNotFound,
    OrderNotFound,
    ProfileNotFound,

    // Conflict errors (5xxx)
    Conflict,
    DuplicateOrder,
    AlreadyManaged,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1002,

            ErrorCode::Unauthenticated => 2001,
            ErrorCode::ExpiredSession => 2002,

            ErrorCode::WrongRole => 3001,
            ErrorCode::Forbidden => 3002,

            ErrorCode::ItemNotFound => 4002,
            ErrorCode::OrderNotFound => 4003,
            ErrorCode::ProfileNotFound => 4004,

            ErrorCode::Conflict => 5001,
            ErrorCode::DuplicateOrder => 5002,
            ErrorCode::AlreadyManaged => 5003,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
        }
    }

    /// Wire name, as used in JSON bodies and the `x-error-code` header
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::ExpiredSession => "EXPIRED_SESSION",
            ErrorCode::WrongRole => "WRONG_ROLE",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ItemNotFound => "ITEM_NOT_FOUND",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::ProfileNotFound => "PROFILE_NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DuplicateOrder => "DUPLICATE_ORDER",
            ErrorCode::AlreadyManaged => "ALREADY_MANAGED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConnectionError => "CONNECTION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Authentication errors
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Session expired")]
    ExpiredSession,

    // Authorization errors
    #[error("This page is not available for your account type")]
    WrongRole { home: &'static str },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // Resource errors
    #[error("Item not found: {code}")]
    ItemNotFound { code: i32 },

    #[error("Order not found: {order_no}")]
    OrderNotFound { order_no: i32 },

    #[error("No {role} profile for user {user_id}")]
    ProfileNotFound { role: &'static str, user_id: i32 },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    #[error("An order for item {item_code} already exists")]
    DuplicateOrder { item_code: i32 },

    #[error("Order {order_no} has already been managed")]
    AlreadyManaged { order_no: i32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::ExpiredSession => ErrorCode::ExpiredSession,
            AppError::WrongRole { .. } => ErrorCode::WrongRole,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            AppError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
            AppError::ProfileNotFound { .. } => ErrorCode::ProfileNotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::DuplicateOrder { .. } => ErrorCode::DuplicateOrder,
            AppError::AlreadyManaged { .. } => ErrorCode::AlreadyManaged,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 302 Found (login / home / duplicate-order redirects)
            AppError::Unauthenticated
            | AppError::ExpiredSession
            | AppError::WrongRole { .. }
            | AppError::DuplicateOrder { .. } => StatusCode::FOUND,

            // 400 Bad Request
            AppError::Validation { .. } | AppError::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 403 Forbidden
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::ItemNotFound { .. }
            | AppError::OrderNotFound { .. }
            | AppError::ProfileNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } | AppError::AlreadyManaged { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Where a redirecting error sends the caller, if it redirects at all
    pub fn redirect_location(&self) -> Option<String> {
        match self {
            AppError::Unauthenticated | AppError::ExpiredSession => {
                Some(redirect::LOGIN.to_string())
            }
            AppError::WrongRole { home } => Some((*home).to_string()),
            AppError::DuplicateOrder { .. } => {
                Some(format!("{}?error=order_exists", redirect::CLIENT_HOME))
            }
            _ => None,
        }
    }

    /// Map a write failure to a conflict when it violated a unique constraint
    pub fn conflict_or_db(err: DbErr, message: impl Into<String>) -> Self {
        if is_unique_violation(&err) {
            AppError::Duplicate {
                message: message.into(),
            }
        } else {
            AppError::Database(err)
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Whether a database error was caused by a unique or primary key constraint
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if let Some(location) = self.redirect_location() {
            tracing::debug!(code = ?code, location = %location, "Redirecting");
            let mut response = redirect::found(&location);
            response
                .headers_mut()
                .insert(ERROR_CODE_HEADER, HeaderValue::from_static(code.as_str()));
            return response;
        }

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let details = match &self {
            AppError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        match rejection {
            FormRejection::FailedToDeserializeForm(e) => AppError::Validation {
                message: e.body_text(),
                field: None,
            },
            FormRejection::FailedToDeserializeFormBody(e) => AppError::Validation {
                message: e.body_text(),
                field: None,
            },
            other => AppError::InvalidFormat {
                message: other.body_text(),
            },
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Internal {
            message: format!("Password hashing failed: {}", err),
        }
    }
}
