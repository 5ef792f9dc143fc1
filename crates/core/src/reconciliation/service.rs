//! Bank account, statement, and statement line creation.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use bursar_shared::types::{BankAccountId, BankStatementId, JournalEntryId, StatementLineId, UserId};

use super::error::ReconciliationError;
use super::matcher::plausibly_belongs;
use super::types::{
    BankAccount, BankStatement, LedgerTransactionSummary, NewBankAccount, NewBankStatement,
    StatementLine, StatementLineInput, StatementStatus,
};
use super::validation::{validate_new_statement, validate_statement_line};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// Stateless service for the import side of reconciliation.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Builds a bank account from validated input.
    pub fn create_bank_account(
        input: &NewBankAccount,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<(BankAccount, AuditEvent), ReconciliationError> {
        input.validate().map_err(ReconciliationError::Validation)?;

        let account = BankAccount {
            id: BankAccountId::new(),
            account_name: input.account_name.trim().to_string(),
            account_number: input.account_number.trim().to_string(),
            bank_name: input.bank_name.trim().to_string(),
            branch: input
                .branch
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            current_balance: Decimal::ZERO,
            is_active: true,
            created_at: now,
        };
        let audit = AuditEvent::new(
            actor,
            AuditAction::BankAccountCreated,
            AuditEntity::BankAccount,
            account.id.into_inner(),
            now,
        )
        .with_after(json!({
            "account_name": account.account_name,
            "account_number": account.account_number,
            "bank_name": account.bank_name,
        }));
        Ok((account, audit))
    }

    /// Builds a `Pending` statement for `account`.
    pub fn create_statement(
        account: &BankAccount,
        input: &NewBankStatement,
        today: NaiveDate,
        scale: u32,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<(BankStatement, AuditEvent), ReconciliationError> {
        let valid =
            validate_new_statement(input, today, scale).map_err(ReconciliationError::Validation)?;

        let statement = BankStatement {
            id: BankStatementId::new(),
            bank_account_id: account.id,
            statement_date: valid.statement_date,
            period_start: valid.period_start,
            period_end: valid.period_end,
            opening_balance: valid.opening_balance,
            closing_balance: valid.closing_balance,
            status: StatementStatus::Pending,
            reconciled_by: None,
            reconciled_at: None,
            created_at: now,
        };
        let audit = AuditEvent::new(
            actor,
            AuditAction::StatementCreated,
            AuditEntity::BankStatement,
            statement.id.into_inner(),
            now,
        )
        .with_after(statement.snapshot());
        Ok((statement, audit))
    }

    /// Validates `input` and builds an unmatched line of `statement`.
    ///
    /// Lines cannot be added to a reconciled statement.
    pub fn add_line(
        statement: &BankStatement,
        input: &StatementLineInput,
        today: NaiveDate,
        scale: u32,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<(StatementLine, AuditEvent), ReconciliationError> {
        if statement.status.is_frozen() {
            return Err(ReconciliationError::StatementReconciled);
        }
        let valid = validate_statement_line(input, statement.statement_date, today, scale)
            .map_err(ReconciliationError::Validation)?;

        let line = StatementLine {
            id: StatementLineId::new(),
            statement_id: statement.id,
            line_date: valid.line_date,
            description: valid.description,
            reference: valid.reference,
            debit_amount: valid.debit_amount,
            credit_amount: valid.credit_amount,
            running_balance: valid.running_balance,
            is_matched: false,
            matched_transaction_id: None,
            matched_by: None,
            matched_at: None,
        };
        let audit = AuditEvent::new(
            actor,
            AuditAction::StatementLineAdded,
            AuditEntity::StatementLine,
            line.id.into_inner(),
            now,
        )
        .with_after(json!({
            "statement_id": line.statement_id,
            "line_date": line.line_date,
            "debit_amount": line.debit_amount,
            "credit_amount": line.credit_amount,
        }));
        Ok((line, audit))
    }

    /// Filters `candidates` down to posted, non-voided transactions dated in
    /// `[start, end]` that no statement line references.
    ///
    /// With an `account`, bank-mediated transactions must also mention it.
    pub fn unmatched_transactions(
        candidates: Vec<LedgerTransactionSummary>,
        matched: &HashSet<JournalEntryId>,
        start: NaiveDate,
        end: NaiveDate,
        account: Option<&BankAccount>,
    ) -> Vec<LedgerTransactionSummary> {
        candidates
            .into_iter()
            .filter(|tx| tx.is_posted && !tx.is_voided)
            .filter(|tx| tx.entry_date >= start && tx.entry_date <= end)
            .filter(|tx| !matched.contains(&tx.entry_id))
            .filter(|tx| account.is_none_or(|acct| plausibly_belongs(tx, acct)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentMethod;
    use crate::reconciliation::matcher::fixtures::{account, statement, tx};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_create_bank_account_trims() {
        let input = NewBankAccount {
            account_name: " Greenfield Academy ".to_string(),
            account_number: "0123456789".to_string(),
            bank_name: "First Bank".to_string(),
            branch: Some("  ".to_string()),
        };
        let (acct, audit) =
            ReconciliationService::create_bank_account(&input, UserId::new(), Utc::now()).unwrap();
        assert_eq!(acct.account_name, "Greenfield Academy");
        assert_eq!(acct.branch, None);
        assert_eq!(acct.current_balance, Decimal::ZERO);
        assert_eq!(audit.action, AuditAction::BankAccountCreated);
    }

    #[test]
    fn test_create_statement_starts_pending() {
        let input = NewBankStatement {
            statement_date: "2026-01-31".to_string(),
            opening_balance: "1000".to_string(),
            closing_balance: "1600".to_string(),
            ..NewBankStatement::default()
        };
        let (stmt, _) = ReconciliationService::create_statement(
            &account(),
            &input,
            date(31),
            2,
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(stmt.status, StatementStatus::Pending);
        assert_eq!(stmt.opening_balance, dec!(1000));
    }

    #[test]
    fn test_add_line_refused_on_reconciled_statement() {
        let s = statement(&account(), StatementStatus::Reconciled);
        let input = StatementLineInput {
            line_date: "2026-01-05".to_string(),
            description: "deposit".to_string(),
            credit_amount: Some("10".to_string()),
            ..StatementLineInput::default()
        };
        assert!(matches!(
            ReconciliationService::add_line(&s, &input, date(31), 2, UserId::new(), Utc::now()),
            Err(ReconciliationError::StatementReconciled)
        ));
    }

    #[test]
    fn test_add_line_reports_all_failures() {
        let s = statement(&account(), StatementStatus::Pending);
        let input = StatementLineInput {
            line_date: "not a date".to_string(),
            ..StatementLineInput::default()
        };
        match ReconciliationService::add_line(&s, &input, date(31), 2, UserId::new(), Utc::now()) {
            Err(ReconciliationError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_transactions_filters() {
        let acct = account();
        let matched_tx = tx(date(5), dec!(10));
        let voided = LedgerTransactionSummary {
            is_voided: true,
            ..tx(date(5), dec!(10))
        };
        let outside = tx(date(20), dec!(10));
        let foreign_transfer = LedgerTransactionSummary {
            payment_method: Some(PaymentMethod::BankTransfer),
            ..tx(date(6), dec!(10))
        };
        let cash = tx(date(7), dec!(10));
        let matched: HashSet<_> = [matched_tx.entry_id].into_iter().collect();

        let candidates = vec![
            matched_tx,
            voided,
            outside,
            foreign_transfer.clone(),
            cash.clone(),
        ];
        let all = ReconciliationService::unmatched_transactions(
            candidates.clone(),
            &matched,
            date(1),
            date(10),
            None,
        );
        assert_eq!(all, vec![foreign_transfer, cash.clone()]);

        let scoped = ReconciliationService::unmatched_transactions(
            candidates,
            &matched,
            date(1),
            date(10),
            Some(&acct),
        );
        assert_eq!(scoped, vec![cash]);
    }
}
