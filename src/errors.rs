//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`QueryError`] names *why* a query string was rejected. Every variant is
//!   a client mistake and aborts the whole parse; nothing is partially applied.
//! - [`ApiError`] is what a handler returns. Query errors become
//!   `400 Bad Request` with their message, database errors become a sanitised
//!   `500` whose details are only logged.
//!
//! ## Logging
//!
//! Internal errors are logged with `tracing`. Enable a subscriber in your
//! application to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt().with_target(false).compact().init();
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Why a column path failed the syntactic allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSyntax {
    /// Contains a character outside `[A-Za-z0-9_.]` (or is empty)
    UnacceptableName,
    /// Starts or ends with a dot
    Unqualified,
}

/// Rejection reasons for a client-supplied query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The `q` payload is not an acceptable JSON filter document
    MalformedFilterSyntax {
        /// The offending input after whitespace stripping
        input: String,
    },
    /// A column path failed the allow-list check
    InvalidColumnSyntax {
        field: String,
        reason: ColumnSyntax,
    },
    /// A relation name that is unknown, or not usable where it appeared
    UndefinedRelation {
        /// Relation name or `relation.column` path as the client sent it
        path: String,
    },
    /// A relation points at a model missing from the catalog
    UndefinedModel { name: String },
    /// One or more referenced columns do not exist on their model
    UndefinedColumnNames { columns: Vec<String> },
}

impl QueryError {
    pub fn malformed(input: impl Into<String>) -> Self {
        Self::MalformedFilterSyntax {
            input: input.into(),
        }
    }

    pub fn undefined_relation(path: impl Into<String>) -> Self {
        Self::UndefinedRelation { path: path.into() }
    }

    pub fn undefined_model(name: impl Into<String>) -> Self {
        Self::UndefinedModel { name: name.into() }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedFilterSyntax { input } => {
                write!(f, "Unacceptable query string: {input}")
            }
            Self::InvalidColumnSyntax {
                field,
                reason: ColumnSyntax::UnacceptableName,
            } => write!(f, "Unacceptable field name: {field}"),
            Self::InvalidColumnSyntax {
                field,
                reason: ColumnSyntax::Unqualified,
            } => write!(f, "You have to define the column specifically: {field}"),
            Self::UndefinedRelation { path } => write!(f, "Undefined relation: {path}"),
            Self::UndefinedModel { name } => write!(f, "Undefined model name: {name}"),
            Self::UndefinedColumnNames { columns } => {
                write!(f, "Undefined column names: {}", columns.join(","))
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - the query string was rejected
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.user_message(),
        });

        (status, body).into_response()
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// All database errors become 500 Internal Server Error (logged internally, sanitized for users)
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}
