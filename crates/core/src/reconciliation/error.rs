//! Reconciliation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use bursar_shared::types::{BankAccountId, BankStatementId, JournalEntryId, StatementLineId};
use bursar_shared::{AppError, ErrorKind};

/// Errors that can occur during bank reconciliation.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    // ========== Validation Errors ==========
    /// One or more input validation failures.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    // ========== Lookup Errors ==========
    /// Bank account not found.
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(BankAccountId),

    /// Bank statement not found.
    #[error("Bank statement not found: {0}")]
    StatementNotFound(BankStatementId),

    /// Statement line not found.
    #[error("Statement line not found: {0}")]
    LineNotFound(StatementLineId),

    /// Journal entry not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(JournalEntryId),

    // ========== State Errors ==========
    /// Bank account number already in use.
    #[error("Bank account number already exists: {0}")]
    DuplicateAccountNumber(String),

    /// Statement is already reconciled.
    #[error("Statement is already reconciled")]
    AlreadyReconciled,

    /// Statement is reconciled and its lines are frozen.
    #[error("Statement is reconciled; its lines can no longer change")]
    StatementReconciled,

    /// Line is already matched.
    #[error("Statement line is already matched to transaction {0}")]
    LineAlreadyMatched(JournalEntryId),

    /// Transaction is matched to another line.
    #[error("Transaction is already matched to statement line {0}")]
    TransactionAlreadyMatched(StatementLineId),

    /// Transaction is voided.
    #[error("Transaction is voided and cannot be matched")]
    TransactionVoided,

    /// Transaction is not posted.
    #[error("Transaction is not posted and cannot be matched")]
    TransactionNotPosted,

    // ========== Business Rule Errors ==========
    /// Bank-mediated transaction does not mention the bank account.
    #[error("Transaction does not reference bank account {account_number} ({account_name})")]
    AccountScopeMismatch {
        /// Bank account number.
        account_number: String,
        /// Bank account name.
        account_name: String,
    },

    /// Amounts differ by more than the tolerance.
    #[error(
        "Amount mismatch: statement {statement_amount}, ledger {ledger_amount}, difference {difference} exceeds tolerance {tolerance}"
    )]
    AmountOutOfTolerance {
        /// Statement line amount.
        statement_amount: Decimal,
        /// Journal entry amount.
        ledger_amount: Decimal,
        /// Absolute difference.
        difference: Decimal,
        /// Configured tolerance.
        tolerance: Decimal,
    },

    /// Dates differ by more than the tolerance.
    #[error(
        "Date mismatch: statement {line_date}, ledger {entry_date}, {days} day(s) apart exceeds tolerance of {tolerance} day(s)"
    )]
    DateOutOfTolerance {
        /// Statement line date.
        line_date: NaiveDate,
        /// Journal entry date.
        entry_date: NaiveDate,
        /// Absolute distance in days.
        days: i64,
        /// Configured tolerance in days.
        tolerance: i64,
    },

    /// A sum or difference of amounts is out of range.
    #[error("Amounts are too large to total")]
    AmountOverflow,

    /// Statement has no lines.
    #[error("Statement has no lines to reconcile")]
    EmptyStatement,

    /// Some lines are not matched.
    #[error("{count} statement line(s) are not matched")]
    UnmatchedLines {
        /// Number of unmatched lines.
        count: usize,
    },

    /// Computed closing balance differs from the declared one.
    #[error(
        "Closing balance mismatch: calculated {calculated}, declared {declared}, variance {variance}"
    )]
    ClosingBalanceMismatch {
        /// Opening balance plus net movements.
        calculated: Decimal,
        /// Closing balance on the statement.
        declared: Decimal,
        /// Declared minus calculated.
        variance: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Statement line was modified concurrently, please reload and retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BankAccountNotFound(_) => "BANK_ACCOUNT_NOT_FOUND",
            Self::StatementNotFound(_) => "STATEMENT_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::DuplicateAccountNumber(_) => "DUPLICATE_ACCOUNT_NUMBER",
            Self::AlreadyReconciled => "ALREADY_RECONCILED",
            Self::StatementReconciled => "STATEMENT_RECONCILED",
            Self::LineAlreadyMatched(_) => "LINE_ALREADY_MATCHED",
            Self::TransactionAlreadyMatched(_) => "TRANSACTION_ALREADY_MATCHED",
            Self::TransactionVoided => "TRANSACTION_VOIDED",
            Self::TransactionNotPosted => "TRANSACTION_NOT_POSTED",
            Self::AccountScopeMismatch { .. } => "ACCOUNT_SCOPE_MISMATCH",
            Self::AmountOutOfTolerance { .. } => "AMOUNT_OUT_OF_TOLERANCE",
            Self::DateOutOfTolerance { .. } => "DATE_OUT_OF_TOLERANCE",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::EmptyStatement => "EMPTY_STATEMENT",
            Self::UnmatchedLines { .. } => "UNMATCHED_LINES",
            Self::ClosingBalanceMismatch { .. } => "CLOSING_BALANCE_MISMATCH",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::AmountOverflow => ErrorKind::Validation,
            Self::BankAccountNotFound(_)
            | Self::StatementNotFound(_)
            | Self::LineNotFound(_)
            | Self::TransactionNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateAccountNumber(_)
            | Self::AlreadyReconciled
            | Self::StatementReconciled
            | Self::LineAlreadyMatched(_)
            | Self::TransactionAlreadyMatched(_)
            | Self::TransactionVoided
            | Self::TransactionNotPosted => ErrorKind::StateConflict,
            Self::AccountScopeMismatch { .. }
            | Self::AmountOutOfTolerance { .. }
            | Self::DateOutOfTolerance { .. }
            | Self::EmptyStatement
            | Self::UnmatchedLines { .. }
            | Self::ClosingBalanceMismatch { .. } => ErrorKind::BusinessRule,
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
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::Validation(errors) => AppError::Validation(errors),
            ReconciliationError::Database(msg) => AppError::Database(msg),
            other => AppError::domain(other.kind(), other.error_code(), other.to_string()),
        }
    }
}
