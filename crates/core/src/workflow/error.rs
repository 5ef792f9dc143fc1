//! Workflow error types for approval rules and approval requests.

use thiserror::Error;

use bursar_shared::types::{ApprovalRequestId, ApprovalRuleId, JournalEntryId};
use bursar_shared::{AppError, ErrorKind};

use crate::ledger::{ApprovalStatus, LedgerError};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Approval request not found.
    #[error("Approval request not found: {0}")]
    RequestNotFound(ApprovalRequestId),

    /// Journal entry behind a request not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Approval rule not found.
    #[error("Approval rule not found: {0}")]
    RuleNotFound(ApprovalRuleId),

    /// Request has already been reviewed.
    #[error("Approval request has already been reviewed (status: {status})")]
    AlreadyReviewed {
        /// The terminal status of the request.
        status: ApprovalStatus,
    },

    /// Entry behind the request has been voided.
    #[error("Cannot approve: the journal entry has been voided")]
    EntryVoided,

    /// Rejection notes are empty.
    #[error("Rejection notes are required")]
    RejectionNotesRequired,

    /// Rule input failed validation.
    #[error("Invalid approval rule: {}", .0.join("; "))]
    InvalidRule(Vec<String>),

    /// Posting the approved entry failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Concurrent modification detected.
    #[error("Approval request was modified concurrently, please reload and retry")]
    ConcurrentModification,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::AlreadyReviewed { .. } => "ALREADY_REVIEWED",
            Self::EntryVoided => "ENTRY_VOIDED",
            Self::RejectionNotesRequired => "REJECTION_NOTES_REQUIRED",
            Self::InvalidRule(_) => "VALIDATION_ERROR",
            Self::Ledger(e) => e.error_code(),
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestNotFound(_) | Self::EntryNotFound(_) | Self::RuleNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyReviewed { .. } | Self::EntryVoided => ErrorKind::StateConflict,
            Self::RejectionNotesRequired | Self::InvalidRule(_) => ErrorKind::Validation,
            Self::Ledger(e) => e.kind(),
            Self::ConcurrentModification => ErrorKind::Concurrency,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Concurrency)
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Ledger(e) => e.into(),
            WorkflowError::InvalidRule(errors) => AppError::Validation(errors),
            WorkflowError::Database(msg) => AppError::Database(msg),
            other => AppError::domain(other.kind(), other.error_code(), other.to_string()),
        }
    }
}
