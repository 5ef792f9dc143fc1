//! Statement line to ledger transaction matching.
//!
//! Matching checks run in a fixed order and stop at the first failure:
//! 1. statement not reconciled, line not already matched
//! 2. transaction posted and not voided
//! 3. transaction not matched to another line
//! 4. bank-mediated transactions mention the bank account
//! 5. amounts within tolerance
//! 6. dates within tolerance (inclusive)
//!
//! The final compare-and-set is the persistence layer's job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bursar_shared::types::{BankStatementId, JournalEntryId, StatementLineId, UserId};

use super::error::ReconciliationError;
use super::types::{
    BankAccount, BankStatement, LedgerTransactionSummary, MatchTolerance, StatementLine,
    StatementStatus,
};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// Decision to match a line to a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAction {
    /// The line being matched.
    pub line_id: StatementLineId,
    /// The line's statement.
    pub statement_id: BankStatementId,
    /// The matched transaction.
    pub entry_id: JournalEntryId,
    /// Who matched.
    pub matched_by: UserId,
    /// When.
    pub matched_at: DateTime<Utc>,
    /// Statement moves `Pending → Partial`.
    pub promote_statement: bool,
    /// Audit record for the change.
    pub audit: AuditEvent,
}

impl MatchAction {
    /// Applies the match to an in-memory line.
    pub fn apply(&self, line: &mut StatementLine) {
        line.is_matched = true;
        line.matched_transaction_id = Some(self.entry_id);
        line.matched_by = Some(self.matched_by);
        line.matched_at = Some(self.matched_at);
    }
}

/// Decision to clear a line's match.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchAction {
    /// The line being cleared.
    pub line_id: StatementLineId,
    /// Audit record for the change.
    pub audit: AuditEvent,
}

impl UnmatchAction {
    /// Applies the unmatch to an in-memory line.
    pub fn apply(&self, line: &mut StatementLine) {
        line.is_matched = false;
        line.matched_transaction_id = None;
        line.matched_by = None;
        line.matched_at = None;
    }
}

/// Returns true if `text` mentions the account number or name, ignoring case.
#[must_use]
pub fn mentions_account(text: &str, account: &BankAccount) -> bool {
    let haystack = text.to_lowercase();
    [&account.account_number, &account.account_name]
        .into_iter()
        .map(|needle| needle.trim().to_lowercase())
        .any(|needle| !needle.is_empty() && haystack.contains(&needle))
}

/// Returns true if the transaction could have moved through `account`.
///
/// Bank transfers and cheques must mention the account in their reference or
/// description; other payment methods are not scoped.
#[must_use]
pub fn plausibly_belongs(tx: &LedgerTransactionSummary, account: &BankAccount) -> bool {
    match tx.payment_method {
        Some(method) if method.is_bank_mediated() => {
            mentions_account(&tx.reference, account) || mentions_account(&tx.description, account)
        }
        _ => true,
    }
}

/// Checks the amount tolerance.
pub fn check_amount(
    statement_amount: Decimal,
    ledger_amount: Decimal,
    tolerance: Decimal,
) -> Result<(), ReconciliationError> {
    let difference = statement_amount
        .checked_sub(ledger_amount)
        .ok_or(ReconciliationError::AmountOverflow)?
        .abs();
    if difference > tolerance {
        return Err(ReconciliationError::AmountOutOfTolerance {
            statement_amount,
            ledger_amount,
            difference,
            tolerance,
        });
    }
    Ok(())
}

/// Checks the day tolerance; a distance equal to the tolerance passes.
pub fn check_date(
    line: &StatementLine,
    tx: &LedgerTransactionSummary,
    tolerance_days: i64,
) -> Result<(), ReconciliationError> {
    let days = (line.line_date - tx.entry_date).num_days().abs();
    if days > tolerance_days {
        return Err(ReconciliationError::DateOutOfTolerance {
            line_date: line.line_date,
            entry_date: tx.entry_date,
            days,
            tolerance: tolerance_days,
        });
    }
    Ok(())
}

/// Stateless matching service.
pub struct MatchService;

impl MatchService {
    /// Decides whether `line` may be matched to `tx`.
    ///
    /// `tx_matched_line` is the line the transaction is currently matched to,
    /// if any.
    #[allow(clippy::too_many_arguments)]
    pub fn match_line(
        statement: &BankStatement,
        account: &BankAccount,
        line: &StatementLine,
        tx: &LedgerTransactionSummary,
        tx_matched_line: Option<StatementLineId>,
        tolerance: MatchTolerance,
        matched_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<MatchAction, ReconciliationError> {
        if statement.status.is_frozen() {
            return Err(ReconciliationError::StatementReconciled);
        }
        if line.is_matched || line.matched_transaction_id.is_some() {
            return Err(ReconciliationError::LineAlreadyMatched(
                line.matched_transaction_id.unwrap_or(tx.entry_id),
            ));
        }
        if tx.is_voided {
            return Err(ReconciliationError::TransactionVoided);
        }
        if !tx.is_posted {
            return Err(ReconciliationError::TransactionNotPosted);
        }
        if let Some(other) = tx_matched_line.filter(|other| *other != line.id) {
            return Err(ReconciliationError::TransactionAlreadyMatched(other));
        }
        if !plausibly_belongs(tx, account) {
            return Err(ReconciliationError::AccountScopeMismatch {
                account_number: account.account_number.clone(),
                account_name: account.account_name.clone(),
            });
        }
        check_amount(line.statement_amount(), tx.amount, tolerance.amount)?;
        check_date(line, tx, tolerance.days)?;

        let action = MatchAction {
            line_id: line.id,
            statement_id: statement.id,
            entry_id: tx.entry_id,
            matched_by,
            matched_at: now,
            promote_statement: statement.status == StatementStatus::Pending,
            audit: AuditEvent::new(
                matched_by,
                AuditAction::LineMatched,
                AuditEntity::StatementLine,
                line.id.into_inner(),
                now,
            ),
        };
        let mut after = line.clone();
        action.apply(&mut after);
        let audit = action
            .audit
            .clone()
            .with_before(line.snapshot())
            .with_after(after.snapshot());
        Ok(MatchAction { audit, ..action })
    }

    /// Decides how to clear a line's match.
    ///
    /// Returns `Ok(None)` when the line is not matched: clearing twice is a
    /// no-op. Lines of reconciled statements are refused.
    pub fn unmatch_line(
        statement: &BankStatement,
        line: &StatementLine,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<UnmatchAction>, ReconciliationError> {
        if statement.status.is_frozen() {
            return Err(ReconciliationError::StatementReconciled);
        }
        if !line.is_matched && line.matched_transaction_id.is_none() {
            return Ok(None);
        }

        let mut after = line.clone();
        let action = UnmatchAction {
            line_id: line.id,
            audit: AuditEvent::new(
                actor,
                AuditAction::LineUnmatched,
                AuditEntity::StatementLine,
                line.id.into_inner(),
                now,
            ),
        };
        action.apply(&mut after);
        let audit = action
            .audit
            .clone()
            .with_before(line.snapshot())
            .with_after(after.snapshot());
        Ok(Some(UnmatchAction { audit, ..action }))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by reconciliation tests.

    use super::*;
    use bursar_shared::types::BankAccountId;
    use chrono::NaiveDate;

    use crate::ledger::{JournalEntryType, PaymentMethod};

    pub fn account() -> BankAccount {
        BankAccount {
            id: BankAccountId::new(),
            account_name: "Greenfield Academy".to_string(),
            account_number: "0123456789".to_string(),
            bank_name: "First Bank".to_string(),
            branch: None,
            current_balance: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn statement(account: &BankAccount, status: StatementStatus) -> BankStatement {
        BankStatement {
            id: BankStatementId::new(),
            bank_account_id: account.id,
            statement_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            period_start: None,
            period_end: None,
            opening_balance: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
            status,
            reconciled_by: None,
            reconciled_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn line(
        statement: &BankStatement,
        line_date: NaiveDate,
        debit: Decimal,
        credit: Decimal,
    ) -> StatementLine {
        StatementLine {
            id: StatementLineId::new(),
            statement_id: statement.id,
            line_date,
            description: "deposit".to_string(),
            reference: None,
            debit_amount: debit,
            credit_amount: credit,
            running_balance: None,
            is_matched: false,
            matched_transaction_id: None,
            matched_by: None,
            matched_at: None,
        }
    }

    pub fn tx(entry_date: NaiveDate, amount: Decimal) -> LedgerTransactionSummary {
        LedgerTransactionSummary {
            entry_id: JournalEntryId::new(),
            reference: "RCPT-100".to_string(),
            description: "Tuition".to_string(),
            entry_date,
            entry_type: JournalEntryType::FeePayment,
            payment_method: Some(PaymentMethod::Cash),
            amount,
            is_posted: true,
            is_voided: false,
        }
    }
}
