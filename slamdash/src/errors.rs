use crate::auth::roles::AccessLevel;
use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::fmt;
use thiserror::Error as ThisError;

/// Where unauthenticated browsers are sent.
pub const LOGIN_PATH: &str = "/login";

/// Why a username/password pair was rejected.
///
/// Only ever logged; every variant renders as the same client-facing message so the response does
/// not reveal whether the account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    NotFound,
    Inactive,
    BadCredential,
}

impl fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialFailure::NotFound => "no such user",
            CredentialFailure::Inactive => "account inactive",
            CredentialFailure::BadCredential => "password mismatch",
        })
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// No valid session was presented
    #[error("Not authenticated")]
    Unauthenticated,

    /// Username/password verification failed
    #[error("Invalid credentials ({reason})")]
    InvalidCredentials { reason: CredentialFailure },

    /// Credentials were fine but the requested access group is above the account's role.
    /// `requested` is `None` when the group string named no known level.
    #[error("Access denied for group {}", requested.map(|r| r.as_str()).unwrap_or("<unrecognised>"))]
    AccessDenied { requested: Option<AccessLevel> },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::SEE_OTHER,
            Error::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            Error::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::InvalidCredentials { .. } => "Invalid credentials".to_string(),
            Error::AccessDenied { .. } => "Access denied for selected group".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { message, .. } => {
                    // SQLite reports the offending column as "table.column"
                    if message.contains("users.email") {
                        "An account with this email address already exists".to_string()
                    } else if message.contains("users.username") {
                        "This username is already taken".to_string()
                    } else {
                        "Resource already exists".to_string()
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::InvalidCredentials { .. } | Error::AccessDenied { .. } => {
                tracing::info!("Login rejected: {}", self);
            }
            Error::Unauthenticated => {
                tracing::debug!("Client error: {}", self);
            }
        }

        match self {
            Error::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            other => (other.status_code(), other.user_message()).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
