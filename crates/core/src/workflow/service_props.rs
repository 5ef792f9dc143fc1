//! Property-based tests for WorkflowService.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use bursar_shared::PostingPolicy;
use bursar_shared::types::UserId;

use crate::ledger::entry::fixtures::balanced;
use crate::ledger::{ApprovalStatus, JournalEntryType};
use crate::workflow::error::WorkflowError;
use crate::workflow::rules::NewApprovalRule;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{ApprovalEffect, ApproverRole, WorkflowAction};

fn arb_status() -> impl Strategy<Value = ApprovalStatus> {
    prop_oneof![
        Just(ApprovalStatus::Pending),
        Just(ApprovalStatus::Approved),
        Just(ApprovalStatus::Rejected),
    ]
}

fn arb_policy() -> impl Strategy<Value = PostingPolicy> {
    prop_oneof![
        Just(PostingPolicy::FirstApproval),
        Just(PostingPolicy::AllApprovals)
    ]
}

fn arb_non_empty_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,40}"
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Only Pending can transition, and only to a terminal status.
    #[test]
    fn prop_transitions_leave_pending_only(from in arb_status(), to in arb_status()) {
        let valid = WorkflowService::is_valid_transition(from, to);
        prop_assert_eq!(valid, from == ApprovalStatus::Pending && to != ApprovalStatus::Pending);
    }

    /// Terminal requests refuse every further review.
    #[test]
    fn prop_terminal_requests_refuse_review(
        terminal in prop_oneof![Just(ApprovalStatus::Approved), Just(ApprovalStatus::Rejected)],
        notes in arb_non_empty_string(),
        policy in arb_policy(),
        cents in 1i64..10_000_000,
    ) {
        let rule = NewApprovalRule {
            name: "All Refunds".to_string(),
            transaction_type: JournalEntryType::Refund,
            min_amount: None,
            max_amount: None,
            min_age_days: None,
            required_approver_role: ApproverRole::Bursar,
        }
        .into_rule(Utc::now())
        .unwrap();
        let entry = balanced(JournalEntryType::Refund, today(), Decimal::new(cents, 2));
        let mut request = WorkflowService::submit(&entry, &[rule], today(), Utc::now())
            .unwrap()
            .requests
            .remove(0);
        request.status = terminal;

        let reviewer = UserId::new();
        let approve =
            WorkflowService::approve(&request, &entry, 0, reviewer, None, policy, Utc::now());
        let is_already_reviewed = matches!(approve, Err(WorkflowError::AlreadyReviewed { .. }));
        prop_assert!(is_already_reviewed);
        let reject = WorkflowService::reject(&request, &entry, UserId::new(), &notes, Utc::now());
        let is_already_reviewed = matches!(reject, Err(WorkflowError::AlreadyReviewed { .. }));
        prop_assert!(is_already_reviewed);
    }

    /// Under all_approvals the entry posts only when no sibling is pending;
    /// under first_approval it always posts.
    #[test]
    fn prop_posting_policy(
        siblings in 0usize..5,
        policy in arb_policy(),
        cents in 1i64..10_000_000,
    ) {
        let rule = NewApprovalRule {
            name: "All Refunds".to_string(),
            transaction_type: JournalEntryType::Refund,
            min_amount: None,
            max_amount: None,
            min_age_days: None,
            required_approver_role: ApproverRole::Bursar,
        }
        .into_rule(Utc::now())
        .unwrap();
        let entry = balanced(JournalEntryType::Refund, today(), Decimal::new(cents, 2));
        let request = WorkflowService::submit(&entry, &[rule], today(), Utc::now())
            .unwrap()
            .requests
            .remove(0);

        let reviewer = UserId::new();
        let action =
            WorkflowService::approve(&request, &entry, siblings, reviewer, None, policy, Utc::now())
                .unwrap();
        let posts = matches!(
            action,
            WorkflowAction::Approve { effect: ApprovalEffect::Post(_), .. }
        );
        let expected = policy == PostingPolicy::FirstApproval || siblings == 0;
        prop_assert_eq!(posts, expected);
    }

    /// Rejection always records the notes in the void reason.
    #[test]
    fn prop_reject_void_reason(notes in arb_non_empty_string()) {
        let rule = NewApprovalRule {
            name: "All Refunds".to_string(),
            transaction_type: JournalEntryType::Refund,
            min_amount: None,
            max_amount: None,
            min_age_days: None,
            required_approver_role: ApproverRole::Bursar,
        }
        .into_rule(Utc::now())
        .unwrap();
        let entry = balanced(JournalEntryType::Refund, today(), Decimal::ONE);
        let request = WorkflowService::submit(&entry, &[rule], today(), Utc::now())
            .unwrap()
            .requests
            .remove(0);
        let action =
            WorkflowService::reject(&request, &entry, UserId::new(), &notes, Utc::now()).unwrap();
        match action {
            WorkflowAction::Reject { void: Some(void), .. } => {
                prop_assert_eq!(void.reason, format!("Rejected: {notes}"));
            }
            other => prop_assert!(false, "expected a void, got {:?}", other),
        }
    }
}
