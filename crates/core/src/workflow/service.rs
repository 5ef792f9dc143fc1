//! Workflow service for approval request state transitions.
//!
//! This module implements the approval state machine:
//! - Submit: one pending request per matched rule when an entry is recorded
//! - Approve: `Pending → Approved`, posting the entry per the posting policy
//! - Reject: `Pending → Rejected`, voiding the entry

use chrono::{DateTime, NaiveDate, Utc};

use bursar_shared::PostingPolicy;
use bursar_shared::types::{ApprovalRequestId, UserId};

use crate::audit::{AuditAction, AuditEntity, AuditEvent};
use crate::ledger::{ApprovalStatus, JournalEntry, LedgerError, LedgerService, PostAction};
use crate::workflow::error::WorkflowError;
use crate::workflow::rules::{ApprovalRule, RuleEngine};
use crate::workflow::types::{ApprovalEffect, ApprovalRequest, Submission, WorkflowAction};

/// Prefix of the void reason written when a request is rejected.
pub const REJECTION_VOID_PREFIX: &str = "Rejected: ";

/// Stateless service for managing approval workflow transitions.
///
/// All methods are associated functions that validate and decide state
/// transitions, returning the resulting action with audit data.
pub struct WorkflowService;

impl WorkflowService {
    /// Evaluates `rules` against a newly recorded entry.
    ///
    /// Creates one pending request per matched rule. The entry starts
    /// `Pending` if any request was created and `Approved` otherwise; either
    /// way it stays unposted.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountOverflow`] if the entry amount cannot be
    /// totalled.
    pub fn submit(
        entry: &JournalEntry,
        rules: &[ApprovalRule],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Submission, LedgerError> {
        let requests: Vec<ApprovalRequest> = RuleEngine::match_rules(rules, entry, today)?
            .into_iter()
            .map(|rule| ApprovalRequest {
                id: ApprovalRequestId::new(),
                entry_id: entry.id,
                rule_id: rule.id,
                status: ApprovalStatus::Pending,
                requested_by: entry.created_by,
                requested_at: now,
                reviewed_by: None,
                reviewed_at: None,
                review_notes: None,
                required_approver_role: rule.required_approver_role,
            })
            .collect();

        let audit = requests
            .iter()
            .map(|r| {
                AuditEvent::new(
                    r.requested_by,
                    AuditAction::RequestCreated,
                    AuditEntity::ApprovalRequest,
                    r.id.into_inner(),
                    now,
                )
                .with_after(r.snapshot())
            })
            .collect();

        let approval_status = if requests.is_empty() {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        };

        Ok(Submission {
            approval_status,
            requests,
            audit,
        })
    }

    /// Approve a pending request.
    ///
    /// # Arguments
    /// * `request` - The request being reviewed
    /// * `entry` - The entry the request gates
    /// * `sibling_pending` - Other requests on the entry still pending
    /// * `reviewed_by` - The reviewer
    /// * `notes` - Optional reviewer notes
    /// * `policy` - When a multiply-gated entry gets posted
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Approve)` describing the request and entry changes
    /// * `Err(WorkflowError::AlreadyReviewed)` if the request is terminal
    /// * `Err(WorkflowError::EntryVoided)` if the entry has been voided
    /// * `Err(WorkflowError::Ledger)` if the entry cannot be posted
    pub fn approve(
        request: &ApprovalRequest,
        entry: &JournalEntry,
        sibling_pending: usize,
        reviewed_by: UserId,
        notes: Option<String>,
        policy: PostingPolicy,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::ensure_pending(request)?;
        if entry.is_voided {
            return Err(WorkflowError::EntryVoided);
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let effect = if entry.is_posted {
            ApprovalEffect::AlreadyPosted
        } else if policy == PostingPolicy::AllApprovals && sibling_pending > 0 {
            ApprovalEffect::AwaitingOtherApprovals {
                pending: sibling_pending,
            }
        } else {
            let post = LedgerService::post_approved(entry, reviewed_by, now)?;
            let mut after = entry.clone();
            after.approval_status = ApprovalStatus::Approved;
            after.approved_by = Some(reviewed_by);
            after.approved_at = Some(now);
            post.apply(&mut after);
            let audit = post.audit.clone().with_after(after.snapshot());
            ApprovalEffect::Post(PostAction { audit, ..post })
        };

        let mut reviewed = request.clone();
        reviewed.status = ApprovalStatus::Approved;
        reviewed.reviewed_by = Some(reviewed_by);
        reviewed.reviewed_at = Some(now);
        reviewed.review_notes.clone_from(&notes);

        Ok(WorkflowAction::Approve {
            request_id: request.id,
            entry_id: entry.id,
            reviewed_by,
            reviewed_at: now,
            notes,
            effect,
            audit: Self::review_audit(request, &reviewed, AuditAction::RequestApproved, now),
        })
    }

    /// Reject a pending request and void its entry.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Reject)`; the void is skipped if the entry is
    ///   already voided
    /// * `Err(WorkflowError::RejectionNotesRequired)` if notes are empty
    /// * `Err(WorkflowError::AlreadyReviewed)` if the request is terminal
    pub fn reject(
        request: &ApprovalRequest,
        entry: &JournalEntry,
        reviewed_by: UserId,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(WorkflowError::RejectionNotesRequired);
        }
        Self::ensure_pending(request)?;

        let void = if entry.is_voided {
            None
        } else {
            Some(LedgerService::void(
                entry,
                &format!("{REJECTION_VOID_PREFIX}{notes}"),
                reviewed_by,
                now,
            )?)
        };

        let mut reviewed = request.clone();
        reviewed.status = ApprovalStatus::Rejected;
        reviewed.reviewed_by = Some(reviewed_by);
        reviewed.reviewed_at = Some(now);
        reviewed.review_notes = Some(notes.to_string());

        Ok(WorkflowAction::Reject {
            request_id: request.id,
            entry_id: entry.id,
            reviewed_by,
            reviewed_at: now,
            notes: notes.to_string(),
            void,
            audit: Self::review_audit(request, &reviewed, AuditAction::RequestRejected, now),
        })
    }

    /// Check if a request status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    #[must_use]
    pub fn is_valid_transition(from: ApprovalStatus, to: ApprovalStatus) -> bool {
        matches!(
            (from, to),
            (
                ApprovalStatus::Pending,
                ApprovalStatus::Approved | ApprovalStatus::Rejected
            )
        )
    }

    fn ensure_pending(request: &ApprovalRequest) -> Result<(), WorkflowError> {
        if request.is_pending() {
            Ok(())
        } else {
            Err(WorkflowError::AlreadyReviewed {
                status: request.status,
            })
        }
    }

    fn review_audit(
        before: &ApprovalRequest,
        after: &ApprovalRequest,
        action: AuditAction,
        now: DateTime<Utc>,
    ) -> AuditEvent {
        let actor = after.reviewed_by.unwrap_or(after.requested_by);
        AuditEvent::new(
            actor,
            action,
            AuditEntity::ApprovalRequest,
            before.id.into_inner(),
            now,
        )
        .with_before(before.snapshot())
        .with_after(after.snapshot())
    }
}
