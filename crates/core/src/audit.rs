//! Audit events.
//!
//! Every state change decided by a domain service carries an [`AuditEvent`].
//! The persistence layer appends it in the same database transaction as the
//! change it records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use bursar_shared::types::UserId;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Account created.
    AccountCreated,
    /// Account deleted.
    AccountDeleted,
    /// Journal entry recorded.
    EntryCreated,
    /// Journal entry posted.
    EntryPosted,
    /// Journal entry voided.
    EntryVoided,
    /// Approval rule created.
    RuleCreated,
    /// Approval rule activated or deactivated.
    RuleUpdated,
    /// Approval request created for an entry.
    RequestCreated,
    /// Approval request approved.
    RequestApproved,
    /// Approval request rejected.
    RequestRejected,
    /// Bank account created.
    BankAccountCreated,
    /// Bank statement created.
    StatementCreated,
    /// Statement line imported.
    StatementLineAdded,
    /// Statement line matched to a journal entry.
    LineMatched,
    /// Statement line match cleared.
    LineUnmatched,
    /// Statement marked reconciled.
    StatementReconciled,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCreated => "account_created",
            Self::AccountDeleted => "account_deleted",
            Self::EntryCreated => "entry_created",
            Self::EntryPosted => "entry_posted",
            Self::EntryVoided => "entry_voided",
            Self::RuleCreated => "rule_created",
            Self::RuleUpdated => "rule_updated",
            Self::RequestCreated => "request_created",
            Self::RequestApproved => "request_approved",
            Self::RequestRejected => "request_rejected",
            Self::BankAccountCreated => "bank_account_created",
            Self::StatementCreated => "statement_created",
            Self::StatementLineAdded => "statement_line_added",
            Self::LineMatched => "line_matched",
            Self::LineUnmatched => "line_unmatched",
            Self::StatementReconciled => "statement_reconciled",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    /// Chart of accounts entry.
    Account,
    /// Journal entry.
    JournalEntry,
    /// Approval rule.
    ApprovalRule,
    /// Approval request.
    ApprovalRequest,
    /// Bank account.
    BankAccount,
    /// Bank statement.
    BankStatement,
    /// Bank statement line.
    StatementLine,
}

impl AuditEntity {
    /// Returns the string representation of the entity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::JournalEntry => "journal_entry",
            Self::ApprovalRule => "approval_rule",
            Self::ApprovalRequest => "approval_request",
            Self::BankAccount => "bank_account",
            Self::BankStatement => "bank_statement",
            Self::StatementLine => "statement_line",
        }
    }
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// User who caused the change.
    pub actor_id: UserId,
    /// What happened.
    pub action: AuditAction,
    /// Kind of record that changed.
    pub entity: AuditEntity,
    /// ID of the record that changed.
    pub entity_id: Uuid,
    /// State before the change, if the record existed.
    pub before: Option<Value>,
    /// State after the change.
    pub after: Option<Value>,
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an audit event.
    #[must_use]
    pub fn new(
        actor_id: UserId,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity,
            entity_id,
            before: None,
            after: None,
            occurred_at,
        }
    }

    /// Attaches the state before the change.
    #[must_use]
    pub fn with_before(mut self, before: Value) -> Self {
        self.before = Some(before);
        self
    }

    /// Attaches the state after the change.
    #[must_use]
    pub fn with_after(mut self, after: Value) -> Self {
        self.after = Some(after);
        self
    }
}
