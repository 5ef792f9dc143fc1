//! Bank statement reconciliation.
//!
//! # Modules
//!
//! - `types` - Bank accounts, statements, lines, and match tolerances
//! - `error` - Reconciliation-specific error types
//! - `validation` - Statement and line import validation
//! - `service` - Bank account, statement, and line creation
//! - `matcher` - Line to transaction matching and unmatching
//! - `closure` - Statement close-out

pub mod closure;
pub mod error;
pub mod matcher;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod matcher_props;

pub use closure::{ClosureService, ReconcileAction, calculated_closing};
pub use error::ReconciliationError;
pub use matcher::{MatchAction, MatchService, UnmatchAction, mentions_account, plausibly_belongs};
pub use service::ReconciliationService;
pub use types::{
    BankAccount, BankStatement, LedgerTransactionSummary, MatchTolerance, NewBankAccount,
    NewBankStatement, StatementLine, StatementLineInput, StatementStatus,
};
pub use validation::{
    ValidatedLine, ValidatedStatement, validate_new_statement, validate_statement_line,
};
