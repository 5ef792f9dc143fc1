//! Ledger repository: journal entries, posting, voiding, and balances.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use bursar_core::ledger::{
    Account, AccountBalance, BalanceLine, JournalEntry, LedgerError, LedgerService,
    NewJournalEntry, PostAction, VoidAction,
};
use bursar_core::workflow::{ApprovalRequest, WorkflowService};
use bursar_shared::types::{AccountId, JournalEntryId, UserId};

use super::approval_rule::ApprovalRuleRepository;
use super::audit::AuditRepository;
use super::convert::{entry_from_rows, stamp};
use super::is_unique_violation;
use crate::entities::{
    accounts, approval_requests, journal_entries, journal_lines,
    sea_orm_active_enums::ApprovalStatus,
};

fn db_error(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// An entry with its approval requests.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDetail {
    /// The entry and its lines.
    #[serde(flatten)]
    pub entry: JournalEntry,
    /// Approval requests gating the entry.
    pub approval_requests: Vec<ApprovalRequest>,
}

/// Attaches line rows to entry rows, preserving entry order.
pub(crate) async fn with_lines<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<journal_entries::Model>,
) -> Result<Vec<JournalEntry>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut lines: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
    for line in journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.is_in(ids))
        .order_by_asc(journal_lines::Column::Id)
        .all(conn)
        .await?
    {
        lines.entry(line.entry_id).or_default().push(line);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let own = lines.remove(&row.id).unwrap_or_default();
            entry_from_rows(row, own)
        })
        .collect())
}

/// Loads one entry with its lines.
pub(crate) async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    let row = journal_entries::Entity::find_by_id(entry_id.into_inner())
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(LedgerError::EntryNotFound(entry_id))?;
    with_lines(conn, vec![row])
        .await
        .map_err(db_error)?
        .pop()
        .ok_or(LedgerError::EntryNotFound(entry_id))
}

/// Flips an entry to posted if it is still unposted and not voided.
pub(crate) async fn apply_post<C: ConnectionTrait>(
    conn: &C,
    action: &PostAction,
) -> Result<(), LedgerError> {
    let result = journal_entries::Entity::update_many()
        .set(journal_entries::ActiveModel {
            is_posted: Set(true),
            posted_by: Set(Some(action.posted_by.into_inner())),
            posted_at: Set(Some(stamp(action.posted_at))),
            ..Default::default()
        })
        .filter(journal_entries::Column::Id.eq(action.entry_id.into_inner()))
        .filter(journal_entries::Column::IsPosted.eq(false))
        .filter(journal_entries::Column::IsVoided.eq(false))
        .exec(conn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        warn!(entry_id = %action.entry_id, "Post lost a race with another change");
        return Err(LedgerError::ConcurrentModification);
    }
    AuditRepository::append(conn, &action.audit)
        .await
        .map_err(db_error)
}

/// Flips an entry to voided if it is not voided yet.
pub(crate) async fn apply_void<C: ConnectionTrait>(
    conn: &C,
    action: &VoidAction,
) -> Result<(), LedgerError> {
    let result = journal_entries::Entity::update_many()
        .set(journal_entries::ActiveModel {
            is_voided: Set(true),
            voided_by: Set(Some(action.voided_by.into_inner())),
            voided_at: Set(Some(stamp(action.voided_at))),
            void_reason: Set(Some(action.reason.clone())),
            ..Default::default()
        })
        .filter(journal_entries::Column::Id.eq(action.entry_id.into_inner()))
        .filter(journal_entries::Column::IsVoided.eq(false))
        .exec(conn)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        warn!(entry_id = %action.entry_id, "Void lost a race with another change");
        return Err(LedgerError::ConcurrentModification);
    }
    AuditRepository::append(conn, &action.audit)
        .await
        .map_err(db_error)
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a new unposted entry and opens one approval request per
    /// matching active rule, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input fails structural validation
    /// - A line references a missing or inactive account
    /// - The reference is already used
    /// - Database operation fails
    pub async fn create_entry(
        &self,
        input: NewJournalEntry,
        scale: u32,
    ) -> Result<EntryDetail, LedgerError> {
        let now = Utc::now();

        let account_ids: Vec<Uuid> = input
            .lines
            .iter()
            .map(|l| l.account_id.into_inner())
            .collect();
        let accounts: HashMap<AccountId, Account> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(account_ids))
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|row| {
                let account = Account::from(row);
                (account.id, account)
            })
            .collect();

        let (mut entry, created) = LedgerService::record(input, &accounts, scale, now)?;

        let taken = journal_entries::Entity::find()
            .filter(journal_entries::Column::Reference.eq(&entry.reference))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(LedgerError::DuplicateReference(entry.reference));
        }

        let rules = ApprovalRuleRepository::active_rules(&self.db)
            .await
            .map_err(db_error)?;
        let submission = WorkflowService::submit(&entry, &rules, now.date_naive(), now)?;
        entry.approval_status = submission.approval_status;
        let created = created.with_after(entry.snapshot());

        let txn = self.db.begin().await.map_err(db_error)?;

        journal_entries::ActiveModel::from(&entry)
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    LedgerError::DuplicateReference(entry.reference.clone())
                } else {
                    db_error(e)
                }
            })?;
        journal_lines::Entity::insert_many(entry.lines.iter().map(journal_lines::ActiveModel::from))
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if submission.is_gated() {
            approval_requests::Entity::insert_many(
                submission.requests.iter().map(approval_requests::ActiveModel::from),
            )
            .exec(&txn)
            .await
            .map_err(db_error)?;
        }
        AuditRepository::append(&txn, &created)
            .await
            .map_err(db_error)?;
        AuditRepository::append_all(&txn, &submission.audit)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;

        info!(
            entry_id = %entry.id,
            reference = %entry.reference,
            entry_type = %entry.entry_type,
            requests = submission.requests.len(),
            "Journal entry created"
        );

        Ok(EntryDetail {
            entry,
            approval_requests: submission.requests,
        })
    }

    /// Fetches an entry with its lines and approval requests.
    pub async fn get_entry(&self, entry_id: JournalEntryId) -> Result<EntryDetail, LedgerError> {
        let entry = load_entry(&self.db, entry_id).await?;
        let approval_requests = approval_requests::Entity::find()
            .filter(approval_requests::Column::EntryId.eq(entry_id.into_inner()))
            .order_by_asc(approval_requests::Column::RequestedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(ApprovalRequest::from)
            .collect();
        Ok(EntryDetail {
            entry,
            approval_requests,
        })
    }

    /// Posts an approved, balanced entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Entry is not found
    /// - Entry is voided or already posted
    /// - Entry has pending approval requests or is not approved
    /// - Entry is unbalanced or has invalid lines
    /// - Entry changed concurrently
    pub async fn post_entry(
        &self,
        entry_id: JournalEntryId,
        posted_by: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut entry = load_entry(&txn, entry_id).await?;
        let pending = approval_requests::Entity::find()
            .filter(approval_requests::Column::EntryId.eq(entry_id.into_inner()))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending))
            .count(&txn)
            .await
            .map_err(db_error)?;

        let action = LedgerService::post(
            &entry,
            usize::try_from(pending).unwrap_or(usize::MAX),
            posted_by,
            Utc::now(),
        )?;
        apply_post(&txn, &action).await?;

        txn.commit().await.map_err(db_error)?;

        action.apply(&mut entry);
        info!(
            entry_id = %entry.id,
            posted_by = %posted_by,
            total = %action.totals.debit,
            "Journal entry posted"
        );
        Ok(entry)
    }

    /// Voids an entry. Irreversible; the lines are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Reason is empty
    /// - Entry is not found or already voided
    /// - Entry changed concurrently
    pub async fn void_entry(
        &self,
        entry_id: JournalEntryId,
        reason: &str,
        voided_by: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut entry = load_entry(&txn, entry_id).await?;
        let action = LedgerService::void(&entry, reason, voided_by, Utc::now())?;
        apply_void(&txn, &action).await?;

        txn.commit().await.map_err(db_error)?;

        action.apply(&mut entry);
        info!(
            entry_id = %entry.id,
            voided_by = %voided_by,
            reason = %action.reason,
            "Journal entry voided"
        );
        Ok(entry)
    }

    /// Balance of an account over posted, non-voided entries dated on or
    /// before `as_of`.
    pub async fn account_balance(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let account: Account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))?
            .into();

        let rows = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(account_id.into_inner()))
            .find_also_related(journal_entries::Entity)
            .filter(journal_entries::Column::IsPosted.eq(true))
            .filter(journal_entries::Column::IsVoided.eq(false))
            .filter(journal_entries::Column::EntryDate.lte(as_of))
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let lines = rows.into_iter().filter_map(|(line, entry)| {
            entry.map(|entry| BalanceLine {
                entry_date: entry.entry_date,
                is_posted: entry.is_posted,
                is_voided: entry.is_voided,
                debit: line.debit_amount,
                credit: line.credit_amount,
            })
        });

        Ok(AccountBalance::from_lines(
            account.id,
            account.normal_balance,
            as_of,
            lines,
        ))
    }
}
