//! Repository abstractions for data access.
//!
//! Repositories load rows, ask the stateless core services for a decision,
//! and execute the resulting action in one database transaction together
//! with its audit records. State flips are compare-and-set updates; zero
//! affected rows is reported as a retryable concurrency conflict.

pub mod account;
pub mod approval_rule;
pub mod audit;
pub(crate) mod convert;
pub mod ledger;
pub mod reconciliation;
pub mod workflow;

pub use account::AccountRepository;
pub use approval_rule::ApprovalRuleRepository;
pub use audit::AuditRepository;
pub use ledger::{EntryDetail, LedgerRepository};
pub use reconciliation::{ReconciliationRepository, StatementWithLines};
pub use workflow::{ReviewOutcome, WorkflowRepository};

use sea_orm::{DbErr, SqlErr};

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
