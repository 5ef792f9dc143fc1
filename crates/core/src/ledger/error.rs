//! Ledger error types for validation and state errors.

use rust_decimal::Decimal;
use thiserror::Error;

use bursar_shared::types::{AccountId, JournalEntryId};
use bursar_shared::{AppError, ErrorKind};

use super::types::ApprovalStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// One or more input validation failures.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Entry has no lines.
    #[error("Entry must have at least one line")]
    NoLines,

    /// A line is not single-sided with a positive amount.
    #[error("Line {line} must have exactly one positive debit or credit amount")]
    InvalidLine {
        /// 1-based line number.
        line: usize,
    },

    /// Entry has only debit lines or only credit lines.
    #[error("Entry must have both debit and credit lines")]
    SingleSided,

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}, Difference: {difference}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
        /// Debit minus credit.
        difference: Decimal,
    },

    /// A total of the entry's amounts is out of range.
    #[error("Entry amounts are too large to total")]
    AmountOverflow,

    /// Void reason is empty.
    #[error("A reason is required to void an entry")]
    VoidReasonRequired,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account code already in use.
    #[error("Account code already exists: {0}")]
    DuplicateAccountCode(String),

    /// Account cannot be its own parent.
    #[error("Account {0} cannot be its own parent")]
    SelfParent(AccountId),

    /// System accounts cannot be deleted.
    #[error("Account {0} is a system account and cannot be deleted")]
    SystemAccount(AccountId),

    /// Account is referenced by journal lines.
    #[error("Account {0} is referenced by journal lines and cannot be deleted")]
    AccountInUse(AccountId),

    // ========== Entry State Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Entry reference already in use.
    #[error("Journal entry reference already exists: {0}")]
    DuplicateReference(String),

    /// Entry is already posted.
    #[error("Journal entry is already posted")]
    AlreadyPosted,

    /// Entry is voided.
    #[error("Journal entry is voided")]
    EntryVoided,

    /// Entry still has pending approval requests.
    #[error("Journal entry has {pending} pending approval request(s)")]
    ApprovalPending {
        /// Number of pending requests.
        pending: usize,
    },

    /// Entry approval status does not allow posting.
    #[error("Journal entry approval status is {0}, expected approved")]
    NotApproved(ApprovalStatus),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NoLines => "NO_LINES",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::SingleSided => "SINGLE_SIDED_ENTRY",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::VoidReasonRequired => "VOID_REASON_REQUIRED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::SelfParent(_) => "SELF_PARENT",
            Self::SystemAccount(_) => "SYSTEM_ACCOUNT",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DuplicateReference(_) => "DUPLICATE_REFERENCE",
            Self::AlreadyPosted => "ALREADY_POSTED",
            Self::EntryVoided => "ENTRY_VOIDED",
            Self::ApprovalPending { .. } => "APPROVAL_PENDING",
            Self::NotApproved(_) => "NOT_APPROVED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::NoLines
            | Self::InvalidLine { .. }
            | Self::AmountOverflow
            | Self::VoidReasonRequired
            | Self::SelfParent(_) => ErrorKind::Validation,

            Self::SingleSided | Self::Unbalanced { .. } | Self::AccountInactive(_) => {
                ErrorKind::BusinessRule
            }

            Self::DuplicateAccountCode(_)
            | Self::SystemAccount(_)
            | Self::AccountInUse(_)
            | Self::DuplicateReference(_)
            | Self::AlreadyPosted
            | Self::EntryVoided
            | Self::ApprovalPending { .. }
            | Self::NotApproved(_) => ErrorKind::StateConflict,

            Self::AccountNotFound(_) | Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::ConcurrentModification => ErrorKind::Concurrency,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(errors) => AppError::Validation(errors),
            LedgerError::Database(msg) => AppError::Database(msg),
            other => AppError::domain(other.kind(), other.error_code(), other.to_string()),
        }
    }
}
