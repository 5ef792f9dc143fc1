//! Workflow repository for approval request reviews and the approval queue.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use bursar_core::ledger::{JournalEntry, LedgerError};
use bursar_core::workflow::{
    ApprovalEffect, ApprovalQueueItem, ApprovalRequest, ApprovalStats, QueueFilter,
    WorkflowAction, WorkflowError, WorkflowService,
};
use bursar_shared::PostingPolicy;
use bursar_shared::types::{ApprovalRequestId, JournalEntryId, UserId};

use super::audit::AuditRepository;
use super::convert::stamp;
use super::ledger::{apply_post, apply_void, load_entry, with_lines};
use crate::entities::{
    approval_requests, approval_rules, journal_entries,
    sea_orm_active_enums::ApprovalStatus,
};

fn db_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}

fn entry_error(err: LedgerError) -> WorkflowError {
    match err {
        LedgerError::EntryNotFound(id) => WorkflowError::EntryNotFound(id),
        other => WorkflowError::Ledger(other),
    }
}

/// A reviewed request with its entry as it stands after the review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// The reviewed request.
    pub request: ApprovalRequest,
    /// The gated entry.
    pub entry: JournalEntry,
}

/// Repository for approval workflow operations.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load_request<C: ConnectionTrait>(
        conn: &C,
        request_id: ApprovalRequestId,
    ) -> Result<ApprovalRequest, WorkflowError> {
        approval_requests::Entity::find_by_id(request_id.into_inner())
            .one(conn)
            .await
            .map_err(db_error)?
            .map(ApprovalRequest::from)
            .ok_or(WorkflowError::RequestNotFound(request_id))
    }

    /// Loads a request after locking its entry row, so reviews of requests
    /// gating the same entry run one at a time.
    async fn load_request_locked<C: ConnectionTrait>(
        conn: &C,
        request_id: ApprovalRequestId,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let entry_id = Self::load_request(conn, request_id).await?.entry_id;
        journal_entries::Entity::find_by_id(entry_id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::EntryNotFound(entry_id))?;
        // Re-read under the lock; a review that finished while we waited is visible now.
        Self::load_request(conn, request_id).await
    }

    /// Flips the request out of `pending`; fails if someone else got there
    /// first.
    async fn apply_review<C: ConnectionTrait>(
        conn: &C,
        action: &WorkflowAction,
    ) -> Result<(), WorkflowError> {
        let (reviewed_by, reviewed_at, notes, audit) = match action {
            WorkflowAction::Approve {
                reviewed_by,
                reviewed_at,
                notes,
                audit,
                ..
            } => (*reviewed_by, *reviewed_at, notes.clone(), audit),
            WorkflowAction::Reject {
                reviewed_by,
                reviewed_at,
                notes,
                audit,
                ..
            } => (*reviewed_by, *reviewed_at, Some(notes.clone()), audit),
        };

        let result = approval_requests::Entity::update_many()
            .set(approval_requests::ActiveModel {
                status: Set(action.new_status().into()),
                reviewed_by: Set(Some(reviewed_by.into_inner())),
                reviewed_at: Set(Some(stamp(reviewed_at))),
                review_notes: Set(notes),
                ..Default::default()
            })
            .filter(approval_requests::Column::Id.eq(action.request_id().into_inner()))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending))
            .exec(conn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            warn!(request_id = %action.request_id(), "Review lost a race with another reviewer");
            return Err(WorkflowError::ConcurrentModification);
        }
        AuditRepository::append(conn, audit)
            .await
            .map_err(db_error)
    }

    async fn set_entry_approval<C: ConnectionTrait>(
        conn: &C,
        entry_id: JournalEntryId,
        model: journal_entries::ActiveModel,
    ) -> Result<(), WorkflowError> {
        journal_entries::Entity::update_many()
            .set(model)
            .filter(journal_entries::Column::Id.eq(entry_id.into_inner()))
            .exec(conn)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Approves a pending request, posting its entry when the posting policy
    /// allows.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Request or entry not found
    /// - Request already reviewed
    /// - Entry voided or not postable
    /// - Request changed concurrently
    pub async fn approve_request(
        &self,
        request_id: ApprovalRequestId,
        reviewed_by: UserId,
        notes: Option<String>,
        policy: PostingPolicy,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut request = Self::load_request_locked(&txn, request_id).await?;
        let mut entry = load_entry(&txn, request.entry_id)
            .await
            .map_err(entry_error)?;
        let sibling_pending = approval_requests::Entity::find()
            .filter(approval_requests::Column::EntryId.eq(request.entry_id.into_inner()))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending))
            .filter(approval_requests::Column::Id.ne(request_id.into_inner()))
            .count(&txn)
            .await
            .map_err(db_error)?;

        let action = WorkflowService::approve(
            &request,
            &entry,
            usize::try_from(sibling_pending).unwrap_or(usize::MAX),
            reviewed_by,
            notes,
            policy,
            Utc::now(),
        )?;
        Self::apply_review(&txn, &action).await?;

        if let WorkflowAction::Approve {
            effect: ApprovalEffect::Post(post),
            reviewed_at,
            ..
        } = &action
        {
            Self::set_entry_approval(
                &txn,
                entry.id,
                journal_entries::ActiveModel {
                    approval_status: Set(ApprovalStatus::Approved),
                    approved_by: Set(Some(reviewed_by.into_inner())),
                    approved_at: Set(Some(stamp(*reviewed_at))),
                    ..Default::default()
                },
            )
            .await?;
            apply_post(&txn, post).await?;
        }

        txn.commit().await.map_err(db_error)?;

        action.apply_to_request(&mut request);
        action.apply_to_entry(&mut entry);
        info!(
            request_id = %request_id,
            entry_id = %entry.id,
            reviewed_by = %reviewed_by,
            posted = entry.is_posted,
            "Approval request approved"
        );
        Ok(ReviewOutcome { request, entry })
    }

    /// Rejects a pending request and voids its entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Notes are empty
    /// - Request or entry not found
    /// - Request already reviewed
    /// - Request changed concurrently
    pub async fn reject_request(
        &self,
        request_id: ApprovalRequestId,
        reviewed_by: UserId,
        notes: &str,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let mut request = Self::load_request_locked(&txn, request_id).await?;
        let mut entry = load_entry(&txn, request.entry_id)
            .await
            .map_err(entry_error)?;

        let action = WorkflowService::reject(&request, &entry, reviewed_by, notes, Utc::now())?;
        Self::apply_review(&txn, &action).await?;

        Self::set_entry_approval(
            &txn,
            entry.id,
            journal_entries::ActiveModel {
                approval_status: Set(ApprovalStatus::Rejected),
                ..Default::default()
            },
        )
        .await?;
        if let WorkflowAction::Reject {
            void: Some(void), ..
        } = &action
        {
            apply_void(&txn, void).await?;
        }

        txn.commit().await.map_err(db_error)?;

        action.apply_to_request(&mut request);
        action.apply_to_entry(&mut entry);
        info!(
            request_id = %request_id,
            entry_id = %entry.id,
            reviewed_by = %reviewed_by,
            "Approval request rejected"
        );
        Ok(ReviewOutcome { request, entry })
    }

    /// Requests joined with their rule and entry summary.
    async fn queue_items(
        &self,
        pending_only: bool,
    ) -> Result<Vec<ApprovalQueueItem>, WorkflowError> {
        let mut query = approval_requests::Entity::find();
        if pending_only {
            query = query.filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending));
        }
        let requests = query
            .order_by_asc(approval_requests::Column::RequestedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let entry_ids: Vec<Uuid> = requests.iter().map(|r| r.entry_id).collect();
        let entry_rows = journal_entries::Entity::find()
            .filter(journal_entries::Column::Id.is_in(entry_ids))
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let entries: HashMap<Uuid, JournalEntry> = with_lines(&self.db, entry_rows)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|e| (e.id.into_inner(), e))
            .collect();

        let rule_ids: Vec<Uuid> = requests.iter().map(|r| r.rule_id).collect();
        let rule_names: HashMap<Uuid, String> = approval_rules::Entity::find()
            .filter(approval_rules::Column::Id.is_in(rule_ids))
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let mut items = Vec::with_capacity(requests.len());
        for row in requests {
            let Some(entry) = entries.get(&row.entry_id) else {
                continue;
            };
            let rule_name = rule_names.get(&row.rule_id).cloned().unwrap_or_default();
            items.push(ApprovalQueueItem {
                request: ApprovalRequest::from(row),
                rule_name,
                entry_reference: entry.reference.clone(),
                entry_type: entry.entry_type,
                entry_date: entry.entry_date,
                entry_amount: entry.amount()?,
                entry_description: entry.description.clone(),
            });
        }
        Ok(items)
    }

    /// The approval queue: pending requests oldest first, or every request
    /// newest first.
    pub async fn approval_queue(
        &self,
        filter: QueueFilter,
    ) -> Result<Vec<ApprovalQueueItem>, WorkflowError> {
        let items = self.queue_items(filter == QueueFilter::Pending).await?;
        Ok(filter.apply(items))
    }

    /// Request counts by status and the amount awaiting approval.
    pub async fn approval_stats(&self) -> Result<ApprovalStats, WorkflowError> {
        let items = self.queue_items(false).await?;
        Ok(ApprovalStats::from_requests(
            items
                .into_iter()
                .map(|item| (item.request.status, item.entry_amount)),
        ))
    }
}
