//! Statement close-out.
//!
//! A statement is reconciled once every line is matched and the opening
//! balance plus net movements equals the declared closing balance within
//! tolerance. Reconciled statements are never reopened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bursar_shared::types::{BankAccountId, BankStatementId, UserId};

use super::error::ReconciliationError;
use super::types::{BankStatement, StatementLine, StatementStatus};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// Decision to reconcile a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileAction {
    /// The statement being closed.
    pub statement_id: BankStatementId,
    /// Its bank account, whose current balance becomes `closing_balance`.
    pub bank_account_id: BankAccountId,
    /// Who reconciled.
    pub reconciled_by: UserId,
    /// When.
    pub reconciled_at: DateTime<Utc>,
    /// Declared closing balance.
    pub closing_balance: Decimal,
    /// Opening plus net movements.
    pub calculated_closing: Decimal,
    /// Audit record for the change.
    pub audit: AuditEvent,
}

impl ReconcileAction {
    /// Applies the reconciliation to an in-memory statement.
    pub fn apply(&self, statement: &mut BankStatement) {
        statement.status = StatementStatus::Reconciled;
        statement.reconciled_by = Some(self.reconciled_by);
        statement.reconciled_at = Some(self.reconciled_at);
    }
}

/// Opening balance plus the net of every line.
///
/// # Errors
///
/// Returns [`ReconciliationError::AmountOverflow`] if the running total
/// leaves the decimal range.
pub fn calculated_closing(
    opening: Decimal,
    lines: &[StatementLine],
) -> Result<Decimal, ReconciliationError> {
    lines.iter().try_fold(opening, |total, line| {
        total
            .checked_add(line.net())
            .ok_or(ReconciliationError::AmountOverflow)
    })
}

/// Stateless close-out service.
pub struct ClosureService;

impl ClosureService {
    /// Decides whether `statement` can be marked reconciled.
    ///
    /// Rejects reconciled statements, empty statements, statements with any
    /// unmatched line, and a computed closing balance further than
    /// `tolerance` from the declared one.
    pub fn reconcile(
        statement: &BankStatement,
        lines: &[StatementLine],
        tolerance: Decimal,
        reconciled_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<ReconcileAction, ReconciliationError> {
        if statement.status == StatementStatus::Reconciled {
            return Err(ReconciliationError::AlreadyReconciled);
        }
        if lines.is_empty() {
            return Err(ReconciliationError::EmptyStatement);
        }
        let unmatched = lines.iter().filter(|l| !l.is_matched).count();
        if unmatched > 0 {
            return Err(ReconciliationError::UnmatchedLines { count: unmatched });
        }

        let calculated = calculated_closing(statement.opening_balance, lines)?;
        let variance = statement
            .closing_balance
            .checked_sub(calculated)
            .ok_or(ReconciliationError::AmountOverflow)?;
        if variance.abs() > tolerance {
            return Err(ReconciliationError::ClosingBalanceMismatch {
                calculated,
                declared: statement.closing_balance,
                variance,
            });
        }

        let action = ReconcileAction {
            statement_id: statement.id,
            bank_account_id: statement.bank_account_id,
            reconciled_by,
            reconciled_at: now,
            closing_balance: statement.closing_balance,
            calculated_closing: calculated,
            audit: AuditEvent::new(
                reconciled_by,
                AuditAction::StatementReconciled,
                AuditEntity::BankStatement,
                statement.id.into_inner(),
                now,
            ),
        };
        let mut after = statement.clone();
        action.apply(&mut after);
        let audit = action
            .audit
            .clone()
            .with_before(statement.snapshot())
            .with_after(after.snapshot());
        Ok(ReconcileAction { audit, ..action })
    }
}
