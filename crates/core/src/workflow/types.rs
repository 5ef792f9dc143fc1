//! Workflow domain types for approval requests.
//!
//! An approval request binds one journal entry to one matched rule. Its
//! status moves `Pending → Approved` or `Pending → Rejected` exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use bursar_shared::types::{ApprovalRequestId, ApprovalRuleId, JournalEntryId, UserId};

use crate::audit::AuditEvent;
use crate::ledger::{ApprovalStatus, JournalEntryType, PostAction, VoidAction};

/// Role a reviewer must hold to decide a request.
///
/// Roles are ordered from lowest to highest authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverRole {
    /// Accounts clerk or accountant.
    Accountant = 0,
    /// School bursar.
    Bursar = 1,
    /// Head of school.
    Principal = 2,
    /// System administrator.
    Admin = 3,
}

impl ApproverRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accountant" => Some(Self::Accountant),
            "bursar" => Some(Self::Bursar),
            "principal" => Some(Self::Principal),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accountant => "accountant",
            Self::Bursar => "bursar",
            Self::Principal => "principal",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An approval request for one entry under one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique identifier.
    pub id: ApprovalRequestId,
    /// The gated entry.
    pub entry_id: JournalEntryId,
    /// The rule that produced this request.
    pub rule_id: ApprovalRuleId,
    /// Current status.
    pub status: ApprovalStatus,
    /// Who recorded the entry.
    pub requested_by: UserId,
    /// When the request was created.
    pub requested_at: DateTime<Utc>,
    /// Who reviewed the request.
    pub reviewed_by: Option<UserId>,
    /// When the request was reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer notes.
    pub review_notes: Option<String>,
    /// Copy of the rule's required role at creation time.
    pub required_approver_role: ApproverRole,
}

impl ApprovalRequest {
    /// Returns true while the request awaits review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "entry_id": self.entry_id,
            "rule_id": self.rule_id,
            "status": self.status,
            "reviewed_by": self.reviewed_by,
            "review_notes": self.review_notes,
        })
    }
}

/// Which requests the approval queue shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueFilter {
    /// Pending requests, oldest first.
    #[default]
    Pending,
    /// Every request, newest first.
    All,
}

impl QueueFilter {
    /// Parses a filter from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Filters and orders queue items.
    #[must_use]
    pub fn apply(self, mut items: Vec<ApprovalQueueItem>) -> Vec<ApprovalQueueItem> {
        match self {
            Self::Pending => {
                items.retain(|i| i.request.is_pending());
                items.sort_by_key(|i| i.request.requested_at);
            }
            Self::All => {
                items.sort_by_key(|i| std::cmp::Reverse(i.request.requested_at));
            }
        }
        items
    }
}

/// A request together with a summary of its entry and rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalQueueItem {
    /// The request.
    #[serde(flatten)]
    pub request: ApprovalRequest,
    /// Name of the rule that produced the request.
    pub rule_name: String,
    /// Entry reference.
    pub entry_reference: String,
    /// Entry type.
    pub entry_type: JournalEntryType,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry amount (debit side).
    pub entry_amount: Decimal,
    /// Entry description.
    pub entry_description: String,
}

/// Request counts and the amount awaiting approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStats {
    /// Pending requests.
    pub pending: u64,
    /// Approved requests.
    pub approved: u64,
    /// Rejected requests.
    pub rejected: u64,
    /// Total entry amount of pending requests.
    pub pending_amount: Decimal,
}

impl ApprovalStats {
    /// Aggregates `(status, entry amount)` pairs, one per request.
    ///
    /// The pending total saturates at the decimal range instead of failing.
    pub fn from_requests(requests: impl IntoIterator<Item = (ApprovalStatus, Decimal)>) -> Self {
        requests
            .into_iter()
            .fold(Self::default(), |mut stats, (status, amount)| {
                match status {
                    ApprovalStatus::Pending => {
                        stats.pending += 1;
                        stats.pending_amount = stats.pending_amount.saturating_add(amount);
                    }
                    ApprovalStatus::Approved => stats.approved += 1,
                    ApprovalStatus::Rejected => stats.rejected += 1,
                }
                stats
            })
    }
}

/// Requests created when an entry is recorded.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Approval status the entry starts with.
    pub approval_status: ApprovalStatus,
    /// One pending request per matched rule.
    pub requests: Vec<ApprovalRequest>,
    /// Audit records for the created requests.
    pub audit: Vec<AuditEvent>,
}

impl Submission {
    /// Returns true if the entry is gated by at least one request.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// What approving a request does to its entry.
#[derive(Debug, Clone)]
pub enum ApprovalEffect {
    /// The entry becomes approved and is posted.
    Post(PostAction),
    /// Other requests on the entry are still pending; the entry waits.
    AwaitingOtherApprovals {
        /// Number of sibling requests still pending.
        pending: usize,
    },
    /// The entry was already posted by an earlier approval.
    AlreadyPosted,
}

/// Workflow action representing a review decision with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Approve a pending request.
    Approve {
        /// The request being approved.
        request_id: ApprovalRequestId,
        /// The gated entry.
        entry_id: JournalEntryId,
        /// The reviewer.
        reviewed_by: UserId,
        /// When the review happened.
        reviewed_at: DateTime<Utc>,
        /// Optional reviewer notes.
        notes: Option<String>,
        /// Effect on the entry.
        effect: ApprovalEffect,
        /// Audit record for the request.
        audit: AuditEvent,
    },
    /// Reject a pending request and void its entry.
    Reject {
        /// The request being rejected.
        request_id: ApprovalRequestId,
        /// The gated entry.
        entry_id: JournalEntryId,
        /// The reviewer.
        reviewed_by: UserId,
        /// When the review happened.
        reviewed_at: DateTime<Utc>,
        /// Reviewer notes (mandatory).
        notes: String,
        /// Void of the entry, unless it was already voided.
        void: Option<VoidAction>,
        /// Audit record for the request.
        audit: AuditEvent,
    },
}

impl WorkflowAction {
    /// Returns the request status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ApprovalStatus {
        match self {
            Self::Approve { .. } => ApprovalStatus::Approved,
            Self::Reject { .. } => ApprovalStatus::Rejected,
        }
    }

    /// Returns the request this action reviews.
    #[must_use]
    pub fn request_id(&self) -> ApprovalRequestId {
        match self {
            Self::Approve { request_id, .. } | Self::Reject { request_id, .. } => *request_id,
        }
    }

    /// Applies the review to an in-memory request.
    pub fn apply_to_request(&self, request: &mut ApprovalRequest) {
        let (reviewed_by, reviewed_at, notes) = match self {
            Self::Approve {
                reviewed_by,
                reviewed_at,
                notes,
                ..
            } => (*reviewed_by, *reviewed_at, notes.clone()),
            Self::Reject {
                reviewed_by,
                reviewed_at,
                notes,
                ..
            } => (*reviewed_by, *reviewed_at, Some(notes.clone())),
        };
        request.status = self.new_status();
        request.reviewed_by = Some(reviewed_by);
        request.reviewed_at = Some(reviewed_at);
        request.review_notes = notes;
    }

    /// Applies the effect on the entry to an in-memory entry.
    pub fn apply_to_entry(&self, entry: &mut crate::ledger::JournalEntry) {
        match self {
            Self::Approve {
                reviewed_by,
                reviewed_at,
                effect: ApprovalEffect::Post(post),
                ..
            } => {
                entry.approval_status = ApprovalStatus::Approved;
                entry.approved_by = Some(*reviewed_by);
                entry.approved_at = Some(*reviewed_at);
                post.apply(entry);
            }
            Self::Approve { .. } => {}
            Self::Reject { void, .. } => {
                entry.approval_status = ApprovalStatus::Rejected;
                if let Some(void) = void {
                    void.apply(entry);
                }
            }
        }
    }
}
