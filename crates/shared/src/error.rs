//! Application-wide error types.
//!
//! Every domain error maps onto one [`ErrorKind`] so the calling layer knows
//! whether to show a validation list, ask the user to reload, or retry.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error taxonomy shared by all domain modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; always reported as a complete list.
    Validation,
    /// Action attempted against an entity in the wrong state.
    StateConflict,
    /// Imbalance, tolerance exceeded, scoping failure.
    BusinessRule,
    /// Optimistic update lost a race; reload and retry.
    Concurrency,
    /// Referenced entity does not exist.
    NotFound,
    /// Store or programming failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind of error.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::BusinessRule => 422,
            Self::StateConflict | Self::Concurrency => 409,
            Self::Internal => 500,
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// One or more validation failures.
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Entity is in the wrong state for the requested action.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Concurrent modification, safe to retry after reloading.
    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Domain error that keeps its own error code.
    #[error("{message}")]
    Domain {
        /// Taxonomy bucket.
        kind: ErrorKind,
        /// Domain error code (e.g. `ALREADY_REVIEWED`).
        code: &'static str,
        /// Human-readable message.
        message: String,
    },
}

impl AppError {
    /// Builds a validation error from a single message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Builds a domain error that keeps its own code.
    #[must_use]
    pub fn domain(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self::Domain {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::StateConflict,
            Self::BusinessRule(_) => ErrorKind::BusinessRule,
            Self::Concurrency(_) => ErrorKind::Concurrency,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
            Self::Domain { kind, .. } => *kind,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "STATE_CONFLICT",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Concurrency(_) => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain { code, .. } => code,
        }
    }

    /// Returns true if the caller may reload and retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Concurrency)
    }

    /// Returns the human-readable messages carried by this error.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::BusinessRule(msg)
            | Self::Concurrency(msg)
            | Self::Database(msg)
            | Self::Internal(msg)
            | Self::Domain { message: msg, .. } => vec![msg.clone()],
        }
    }
}
