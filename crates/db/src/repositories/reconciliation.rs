//! Reconciliation repository: bank accounts, statements, matching, close-out.
//!
//! Every state change on a statement or its lines first takes a row lock on
//! the statement, so matching and close-out of the same statement serialize.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

use bursar_core::ledger::LedgerError;
use bursar_core::reconciliation::{
    BankAccount, BankStatement, ClosureService, LedgerTransactionSummary, MatchService,
    MatchTolerance, NewBankAccount, NewBankStatement, ReconciliationError, ReconciliationService,
    StatementLine, StatementLineInput,
};
use bursar_shared::types::{BankAccountId, BankStatementId, JournalEntryId, StatementLineId, UserId};

use super::audit::AuditRepository;
use super::convert::stamp;
use super::is_unique_violation;
use super::ledger::{load_entry, with_lines};
use crate::entities::{
    bank_accounts, bank_statement_lines, bank_statements, journal_entries,
    sea_orm_active_enums::StatementStatus,
};

fn db_error(err: DbErr) -> ReconciliationError {
    ReconciliationError::Database(err.to_string())
}

/// A statement with its lines in date order.
#[derive(Debug, Clone, Serialize)]
pub struct StatementWithLines {
    /// The statement.
    #[serde(flatten)]
    pub statement: BankStatement,
    /// Its lines.
    pub lines: Vec<StatementLine>,
}

/// Repository for bank reconciliation.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========== Loading ==========

    async fn load_bank_account<C: ConnectionTrait>(
        conn: &C,
        id: BankAccountId,
    ) -> Result<BankAccount, ReconciliationError> {
        bank_accounts::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await
            .map_err(db_error)?
            .map(BankAccount::from)
            .ok_or(ReconciliationError::BankAccountNotFound(id))
    }

    /// Loads a statement, locking its row for the rest of the transaction.
    async fn lock_statement<C: ConnectionTrait>(
        conn: &C,
        id: BankStatementId,
    ) -> Result<BankStatement, ReconciliationError> {
        bank_statements::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .map(BankStatement::from)
            .ok_or(ReconciliationError::StatementNotFound(id))
    }

    async fn load_line<C: ConnectionTrait>(
        conn: &C,
        id: StatementLineId,
    ) -> Result<StatementLine, ReconciliationError> {
        bank_statement_lines::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await
            .map_err(db_error)?
            .map(StatementLine::from)
            .ok_or(ReconciliationError::LineNotFound(id))
    }

    async fn load_lines<C: ConnectionTrait>(
        conn: &C,
        statement_id: BankStatementId,
    ) -> Result<Vec<StatementLine>, ReconciliationError> {
        Ok(bank_statement_lines::Entity::find()
            .filter(bank_statement_lines::Column::StatementId.eq(statement_id.into_inner()))
            .order_by_asc(bank_statement_lines::Column::LineDate)
            .order_by_asc(bank_statement_lines::Column::Id)
            .all(conn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(StatementLine::from)
            .collect())
    }

    // ========== Bank Accounts ==========

    /// Lists bank accounts by name.
    pub async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, ReconciliationError> {
        Ok(bank_accounts::Entity::find()
            .order_by_asc(bank_accounts::Column::AccountName)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(BankAccount::from)
            .collect())
    }

    /// Creates a bank account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required field is blank
    /// - The account number is already registered
    pub async fn create_bank_account(
        &self,
        input: &NewBankAccount,
        actor: UserId,
    ) -> Result<BankAccount, ReconciliationError> {
        let (account, audit) =
            ReconciliationService::create_bank_account(input, actor, Utc::now())?;

        let taken = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::AccountNumber.eq(&account.account_number))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(ReconciliationError::DuplicateAccountNumber(
                account.account_number,
            ));
        }

        let txn = self.db.begin().await.map_err(db_error)?;
        bank_accounts::ActiveModel::from(&account)
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ReconciliationError::DuplicateAccountNumber(account.account_number.clone())
                } else {
                    db_error(e)
                }
            })?;
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            bank_account_id = %account.id,
            bank_name = %account.bank_name,
            "Bank account created"
        );
        Ok(account)
    }

    // ========== Statements ==========

    /// Lists statements, newest first, optionally for one bank account.
    pub async fn list_statements(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> Result<Vec<BankStatement>, ReconciliationError> {
        let mut query = bank_statements::Entity::find();
        if let Some(id) = bank_account_id {
            query = query.filter(bank_statements::Column::BankAccountId.eq(id.into_inner()));
        }
        Ok(query
            .order_by_desc(bank_statements::Column::StatementDate)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(BankStatement::from)
            .collect())
    }

    /// Creates a `pending` statement.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Bank account not found
    /// - Dates or amounts fail validation
    pub async fn create_statement(
        &self,
        input: &NewBankStatement,
        scale: u32,
        actor: UserId,
    ) -> Result<BankStatement, ReconciliationError> {
        let account = Self::load_bank_account(&self.db, input.bank_account_id).await?;
        let now = Utc::now();
        let (statement, audit) = ReconciliationService::create_statement(
            &account,
            input,
            now.date_naive(),
            scale,
            actor,
            now,
        )?;

        let txn = self.db.begin().await.map_err(db_error)?;
        bank_statements::ActiveModel::from(&statement)
            .insert(&txn)
            .await
            .map_err(db_error)?;
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            statement_id = %statement.id,
            bank_account_id = %account.id,
            statement_date = %statement.statement_date,
            "Bank statement created"
        );
        Ok(statement)
    }

    /// Fetches a statement with its lines.
    pub async fn get_statement_with_lines(
        &self,
        statement_id: BankStatementId,
    ) -> Result<StatementWithLines, ReconciliationError> {
        let statement = bank_statements::Entity::find_by_id(statement_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(BankStatement::from)
            .ok_or(ReconciliationError::StatementNotFound(statement_id))?;
        let lines = Self::load_lines(&self.db, statement_id).await?;
        Ok(StatementWithLines { statement, lines })
    }

    /// Adds an unmatched line to a statement that is not reconciled.
    pub async fn add_line(
        &self,
        statement_id: BankStatementId,
        input: &StatementLineInput,
        scale: u32,
        actor: UserId,
    ) -> Result<StatementLine, ReconciliationError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let statement = Self::lock_statement(&txn, statement_id).await?;
        let now = Utc::now();
        let (line, audit) = ReconciliationService::add_line(
            &statement,
            input,
            now.date_naive(),
            scale,
            actor,
            now,
        )?;
        bank_statement_lines::ActiveModel::from(&line)
            .insert(&txn)
            .await
            .map_err(db_error)?;
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(line_id = %line.id, statement_id = %statement_id, "Statement line added");
        Ok(line)
    }

    // ========== Matching ==========

    /// Matches a statement line to a posted ledger transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Line, statement, bank account, or transaction not found
    /// - Statement is reconciled
    /// - Line or transaction is already matched elsewhere
    /// - Transaction is voided, unposted, or belongs to another bank account
    /// - Amount or date is outside tolerance
    pub async fn match_line(
        &self,
        line_id: StatementLineId,
        entry_id: JournalEntryId,
        matched_by: UserId,
        tolerance: MatchTolerance,
    ) -> Result<StatementLine, ReconciliationError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut line = Self::load_line(&txn, line_id).await?;
        let statement = Self::lock_statement(&txn, line.statement_id).await?;
        let account = Self::load_bank_account(&txn, statement.bank_account_id).await?;
        let entry = load_entry(&txn, entry_id).await.map_err(|e| match e {
            LedgerError::EntryNotFound(id) => ReconciliationError::TransactionNotFound(id),
            other => ReconciliationError::Database(other.to_string()),
        })?;
        let tx_matched_line = bank_statement_lines::Entity::find()
            .filter(bank_statement_lines::Column::MatchedTransactionId.eq(entry_id.into_inner()))
            .one(&txn)
            .await
            .map_err(db_error)?
            .map(|row| StatementLineId::from_uuid(row.id));

        let action = MatchService::match_line(
            &statement,
            &account,
            &line,
            &LedgerTransactionSummary::try_from(&entry)?,
            tx_matched_line,
            tolerance,
            matched_by,
            Utc::now(),
        )?;

        let result = bank_statement_lines::Entity::update_many()
            .set(bank_statement_lines::ActiveModel {
                is_matched: Set(true),
                matched_transaction_id: Set(Some(action.entry_id.into_inner())),
                matched_by: Set(Some(action.matched_by.into_inner())),
                matched_at: Set(Some(stamp(action.matched_at))),
                ..Default::default()
            })
            .filter(bank_statement_lines::Column::Id.eq(line_id.into_inner()))
            .filter(bank_statement_lines::Column::IsMatched.eq(false))
            .filter(bank_statement_lines::Column::MatchedTransactionId.is_null())
            .exec(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ReconciliationError::ConcurrentModification
                } else {
                    db_error(e)
                }
            })?;
        if result.rows_affected == 0 {
            warn!(line_id = %line_id, "Match lost a race with another change");
            return Err(ReconciliationError::ConcurrentModification);
        }

        if action.promote_statement {
            bank_statements::Entity::update_many()
                .set(bank_statements::ActiveModel {
                    status: Set(StatementStatus::Partial),
                    ..Default::default()
                })
                .filter(bank_statements::Column::Id.eq(action.statement_id.into_inner()))
                .filter(bank_statements::Column::Status.eq(StatementStatus::Pending))
                .exec(&txn)
                .await
                .map_err(db_error)?;
        }
        AuditRepository::append(&txn, &action.audit)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        action.apply(&mut line);
        info!(
            line_id = %line_id,
            entry_id = %entry_id,
            matched_by = %matched_by,
            "Statement line matched"
        );
        Ok(line)
    }

    /// Clears the match on a line. Unmatching an unmatched line changes
    /// nothing.
    pub async fn unmatch_line(
        &self,
        line_id: StatementLineId,
        actor: UserId,
    ) -> Result<StatementLine, ReconciliationError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut line = Self::load_line(&txn, line_id).await?;
        let statement = Self::lock_statement(&txn, line.statement_id).await?;
        let Some(action) = MatchService::unmatch_line(&statement, &line, actor, Utc::now())? else {
            return Ok(line);
        };

        bank_statement_lines::Entity::update_many()
            .set(bank_statement_lines::ActiveModel {
                is_matched: Set(false),
                matched_transaction_id: Set(None),
                matched_by: Set(None),
                matched_at: Set(None),
                ..Default::default()
            })
            .filter(bank_statement_lines::Column::Id.eq(line_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        AuditRepository::append(&txn, &action.audit)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        action.apply(&mut line);
        info!(line_id = %line_id, actor = %actor, "Statement line unmatched");
        Ok(line)
    }

    // ========== Close-out ==========

    /// Marks a fully matched statement reconciled and sets its bank
    /// account's current balance to the declared closing balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Statement not found or already reconciled
    /// - Statement has no lines or unmatched lines
    /// - Computed closing balance differs from the declared one beyond
    ///   `closing_tolerance`
    pub async fn reconcile_statement(
        &self,
        statement_id: BankStatementId,
        reconciled_by: UserId,
        closing_tolerance: Decimal,
    ) -> Result<BankStatement, ReconciliationError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut statement = Self::lock_statement(&txn, statement_id).await?;
        let lines = Self::load_lines(&txn, statement_id).await?;
        let action = ClosureService::reconcile(
            &statement,
            &lines,
            closing_tolerance,
            reconciled_by,
            Utc::now(),
        )?;

        let result = bank_statements::Entity::update_many()
            .set(bank_statements::ActiveModel {
                status: Set(StatementStatus::Reconciled),
                reconciled_by: Set(Some(action.reconciled_by.into_inner())),
                reconciled_at: Set(Some(stamp(action.reconciled_at))),
                ..Default::default()
            })
            .filter(bank_statements::Column::Id.eq(statement_id.into_inner()))
            .filter(bank_statements::Column::Status.ne(StatementStatus::Reconciled))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if result.rows_affected == 0 {
            warn!(statement_id = %statement_id, "Close-out lost a race with another change");
            return Err(ReconciliationError::ConcurrentModification);
        }

        bank_accounts::Entity::update_many()
            .set(bank_accounts::ActiveModel {
                current_balance: Set(action.closing_balance),
                ..Default::default()
            })
            .filter(bank_accounts::Column::Id.eq(action.bank_account_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        AuditRepository::append(&txn, &action.audit)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        action.apply(&mut statement);
        info!(
            statement_id = %statement_id,
            reconciled_by = %reconciled_by,
            closing_balance = %action.closing_balance,
            "Bank statement reconciled"
        );
        Ok(statement)
    }

    /// Posted, non-voided transactions dated in `[start, end]` that no line
    /// is matched to. With a bank account, bank-mediated transactions must
    /// mention it.
    pub async fn unmatched_transactions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        bank_account_id: Option<BankAccountId>,
    ) -> Result<Vec<LedgerTransactionSummary>, ReconciliationError> {
        let account = match bank_account_id {
            Some(id) => Some(Self::load_bank_account(&self.db, id).await?),
            None => None,
        };

        let rows = journal_entries::Entity::find()
            .filter(journal_entries::Column::IsPosted.eq(true))
            .filter(journal_entries::Column::IsVoided.eq(false))
            .filter(journal_entries::Column::EntryDate.between(start, end))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::Reference)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let candidates = with_lines(&self.db, rows)
            .await
            .map_err(db_error)?
            .iter()
            .map(LedgerTransactionSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let matched: HashSet<JournalEntryId> = bank_statement_lines::Entity::find()
            .filter(bank_statement_lines::Column::MatchedTransactionId.is_not_null())
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .filter_map(|row| row.matched_transaction_id.map(JournalEntryId::from_uuid))
            .collect();

        Ok(ReconciliationService::unmatched_transactions(
            candidates,
            &matched,
            start,
            end,
            account.as_ref(),
        ))
    }
}
