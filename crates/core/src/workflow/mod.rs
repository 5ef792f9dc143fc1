//! Approval workflow for journal entries.
//!
//! # Modules
//!
//! - `types` - Request, queue, and action types
//! - `error` - Workflow-specific error types
//! - `rules` - Approval rules engine
//! - `service` - Submit/approve/reject state transitions

pub mod error;
pub mod rules;
pub mod service;
pub mod types;

#[cfg(test)]
mod rules_props;
#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use rules::{ApprovalRule, NewApprovalRule, RuleEngine};
pub use service::{REJECTION_VOID_PREFIX, WorkflowService};
pub use types::{
    ApprovalEffect, ApprovalQueueItem, ApprovalRequest, ApprovalStats, ApproverRole, QueueFilter,
    Submission, WorkflowAction,
};
