//! Ledger service for journal entry recording, posting, and voiding.
//!
//! This module provides the core business logic for journal entry state
//! changes. Each operation validates the current state and returns an action
//! describing the change; the persistence layer applies it atomically.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use bursar_shared::types::{AccountId, JournalEntryId, JournalLineId, UserId};

use super::account::Account;
use super::entry::{JournalEntry, JournalLine};
use super::error::LedgerError;
use super::types::{ApprovalStatus, EntryTotals, NewJournalEntry};
use super::validation::{validate_for_posting, validate_new_entry};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// Decision to post an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PostAction {
    /// Entry to post.
    pub entry_id: JournalEntryId,
    /// Who posts it.
    pub posted_by: UserId,
    /// When it is posted.
    pub posted_at: DateTime<Utc>,
    /// Validated totals.
    pub totals: EntryTotals,
    /// Audit record for the change.
    pub audit: AuditEvent,
}

impl PostAction {
    /// Applies the posting to an in-memory entry.
    pub fn apply(&self, entry: &mut JournalEntry) {
        entry.is_posted = true;
        entry.posted_by = Some(self.posted_by);
        entry.posted_at = Some(self.posted_at);
    }
}

/// Decision to void an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct VoidAction {
    /// Entry to void.
    pub entry_id: JournalEntryId,
    /// Who voids it.
    pub voided_by: UserId,
    /// When it is voided.
    pub voided_at: DateTime<Utc>,
    /// Why it is voided.
    pub reason: String,
    /// Audit record for the change.
    pub audit: AuditEvent,
}

impl VoidAction {
    /// Applies the void to an in-memory entry.
    pub fn apply(&self, entry: &mut JournalEntry) {
        entry.is_voided = true;
        entry.voided_by = Some(self.voided_by);
        entry.voided_at = Some(self.voided_at);
        entry.void_reason = Some(self.reason.clone());
    }
}

/// Stateless ledger service.
///
/// All methods are associated functions with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates input and builds a new, unposted entry.
    ///
    /// `accounts` must contain every account the lines reference that exists;
    /// `scale` is the number of decimal places amounts may carry.
    /// The entry starts out `Approved`; the approval workflow lowers it to
    /// `Pending` when rules match.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing every structural problem, or the
    /// first missing or inactive account.
    pub fn record(
        input: NewJournalEntry,
        accounts: &HashMap<AccountId, Account>,
        scale: u32,
        now: DateTime<Utc>,
    ) -> Result<(JournalEntry, AuditEvent), LedgerError> {
        validate_new_entry(&input, scale)?;
        Self::validate_accounts(&input, accounts)?;

        let id = JournalEntryId::new();
        let lines = input
            .lines
            .into_iter()
            .map(|l| JournalLine {
                id: JournalLineId::new(),
                entry_id: id,
                account_id: l.account_id,
                debit_amount: l.debit_amount,
                credit_amount: l.credit_amount,
                memo: l.memo,
            })
            .collect();

        let entry = JournalEntry {
            id,
            reference: input.reference.trim().to_string(),
            entry_date: input.entry_date,
            entry_type: input.entry_type,
            description: input.description.trim().to_string(),
            student_id: input.student_id,
            staff_id: input.staff_id,
            term_id: input.term_id,
            payment_method: input.payment_method,
            created_by: input.created_by,
            created_at: now,
            is_posted: false,
            posted_by: None,
            posted_at: None,
            approval_status: ApprovalStatus::Approved,
            approved_by: None,
            approved_at: None,
            is_voided: false,
            voided_by: None,
            voided_at: None,
            void_reason: None,
            lines,
        };

        let audit = AuditEvent::new(
            entry.created_by,
            AuditAction::EntryCreated,
            AuditEntity::JournalEntry,
            entry.id.into_inner(),
            now,
        )
        .with_after(entry.snapshot());

        Ok((entry, audit))
    }

    /// Checks that every referenced account exists and is active.
    pub fn validate_accounts(
        input: &NewJournalEntry,
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<(), LedgerError> {
        for line in &input.lines {
            let account = accounts
                .get(&line.account_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id))?;
            if !account.is_active {
                return Err(LedgerError::AccountInactive(account.id));
            }
        }
        Ok(())
    }

    /// Decides whether an entry may be posted by `posted_by`.
    ///
    /// Refused for voided or already-posted entries, for entries with pending
    /// approval requests or an approval status other than `Approved`, and for
    /// entries whose lines break the double-entry rules.
    pub fn post(
        entry: &JournalEntry,
        pending_requests: usize,
        posted_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<PostAction, LedgerError> {
        Self::ensure_postable_state(entry)?;
        if pending_requests > 0 {
            return Err(LedgerError::ApprovalPending {
                pending: pending_requests,
            });
        }
        if entry.approval_status != ApprovalStatus::Approved {
            return Err(LedgerError::NotApproved(entry.approval_status));
        }
        Self::post_approved(entry, posted_by, now)
    }

    /// Posts an entry whose approval has just been granted.
    ///
    /// The approval gate is the caller's responsibility; state and balance
    /// checks still apply.
    pub fn post_approved(
        entry: &JournalEntry,
        posted_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<PostAction, LedgerError> {
        Self::ensure_postable_state(entry)?;
        let totals = validate_for_posting(&entry.lines)?;

        let mut after = entry.clone();
        let action = PostAction {
            entry_id: entry.id,
            posted_by,
            posted_at: now,
            totals,
            audit: AuditEvent::new(
                posted_by,
                AuditAction::EntryPosted,
                AuditEntity::JournalEntry,
                entry.id.into_inner(),
                now,
            ),
        };
        action.apply(&mut after);

        let audit = action
            .audit
            .clone()
            .with_before(entry.snapshot())
            .with_after(after.snapshot());
        Ok(PostAction { audit, ..action })
    }

    /// Decides whether an entry may be voided.
    ///
    /// Any non-voided entry may be voided, posted or not. The reason is
    /// mandatory and voiding is irreversible.
    pub fn void(
        entry: &JournalEntry,
        reason: &str,
        voided_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<VoidAction, LedgerError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::VoidReasonRequired);
        }
        if entry.is_voided {
            return Err(LedgerError::EntryVoided);
        }

        let action = VoidAction {
            entry_id: entry.id,
            voided_by,
            voided_at: now,
            reason: reason.to_string(),
            audit: AuditEvent::new(
                voided_by,
                AuditAction::EntryVoided,
                AuditEntity::JournalEntry,
                entry.id.into_inner(),
                now,
            ),
        };
        let mut after = entry.clone();
        action.apply(&mut after);

        let audit = action
            .audit
            .clone()
            .with_before(entry.snapshot())
            .with_after(after.snapshot());
        Ok(VoidAction { audit, ..action })
    }

    fn ensure_postable_state(entry: &JournalEntry) -> Result<(), LedgerError> {
        if entry.is_voided {
            return Err(LedgerError::EntryVoided);
        }
        if entry.is_posted {
            return Err(LedgerError::AlreadyPosted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::fixtures::{balanced, credit, debit, entry};
    use crate::ledger::types::{AccountType, JournalEntryType, NewJournalLine, NormalBalance};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    fn account(is_active: bool) -> Account {
        Account {
            id: AccountId::new(),
            code: "1000".to_string(),
            name: "Cash".to_string(),
            account_type: AccountType::Asset,
            normal_balance: NormalBalance::Debit,
            parent_id: None,
            is_system_account: false,
            is_active,
            created_at: Utc::now(),
        }
    }

    fn input(cash: AccountId, revenue: AccountId) -> NewJournalEntry {
        NewJournalEntry {
            reference: " RCPT-1 ".to_string(),
            entry_date: date(),
            entry_type: JournalEntryType::FeePayment,
            description: "Term 1 tuition".to_string(),
            student_id: None,
            staff_id: None,
            term_id: None,
            payment_method: None,
            created_by: UserId::new(),
            lines: vec![
                NewJournalLine {
                    account_id: cash,
                    debit_amount: dec!(5000),
                    credit_amount: dec!(0),
                    memo: None,
                },
                NewJournalLine {
                    account_id: revenue,
                    debit_amount: dec!(0),
                    credit_amount: dec!(5000),
                    memo: Some("tuition".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_record_builds_unposted_entry() {
        let cash = account(true);
        let revenue = account(true);
        let accounts = HashMap::from([(cash.id, cash.clone()), (revenue.id, revenue.clone())]);

        let (entry, audit) =
            LedgerService::record(input(cash.id, revenue.id), &accounts, 2, Utc::now()).unwrap();
        assert_eq!(entry.reference, "RCPT-1");
        assert!(!entry.is_posted);
        assert_eq!(entry.lines.len(), 2);
        assert!(entry.lines.iter().all(|l| l.entry_id == entry.id));
        assert_eq!(audit.action, AuditAction::EntryCreated);
    }

    #[test]
    fn test_record_rejects_missing_and_inactive_accounts() {
        let cash = account(true);
        let inactive = account(false);
        let accounts = HashMap::from([(cash.id, cash.clone()), (inactive.id, inactive.clone())]);

        let missing = AccountId::new();
        assert!(matches!(
            LedgerService::record(input(cash.id, missing), &accounts, 2, Utc::now()),
            Err(LedgerError::AccountNotFound(id)) if id == missing
        ));
        assert!(matches!(
            LedgerService::record(input(cash.id, inactive.id), &accounts, 2, Utc::now()),
            Err(LedgerError::AccountInactive(_))
        ));
    }

    #[test]
    fn test_post_balanced_entry() {
        let e = balanced(JournalEntryType::FeePayment, date(), dec!(5000));
        let user = UserId::new();
        let action = LedgerService::post(&e, 0, user, Utc::now()).unwrap();
        assert_eq!(action.posted_by, user);
        assert_eq!(action.totals.debit, dec!(5000));
        assert_eq!(action.audit.action, AuditAction::EntryPosted);
        assert_eq!(action.audit.after.as_ref().unwrap()["is_posted"], true);

        let mut posted = e.clone();
        action.apply(&mut posted);
        assert!(posted.is_effective());
    }

    #[test]
    fn test_post_refused_when_gated() {
        let e = balanced(JournalEntryType::Refund, date(), dec!(10));
        assert!(matches!(
            LedgerService::post(&e, 1, UserId::new(), Utc::now()),
            Err(LedgerError::ApprovalPending { pending: 1 })
        ));

        let mut rejected = e.clone();
        rejected.approval_status = ApprovalStatus::Rejected;
        assert!(matches!(
            LedgerService::post(&rejected, 0, UserId::new(), Utc::now()),
            Err(LedgerError::NotApproved(ApprovalStatus::Rejected))
        ));
    }

    #[test]
    fn test_post_refused_for_posted_or_voided() {
        let mut e = balanced(JournalEntryType::Expense, date(), dec!(10));
        e.is_posted = true;
        assert!(matches!(
            LedgerService::post(&e, 0, UserId::new(), Utc::now()),
            Err(LedgerError::AlreadyPosted)
        ));
        e.is_voided = true;
        assert!(matches!(
            LedgerService::post(&e, 0, UserId::new(), Utc::now()),
            Err(LedgerError::EntryVoided)
        ));
    }

    #[test]
    fn test_post_unbalanced_is_never_corrected() {
        let e = entry(
            JournalEntryType::Expense,
            date(),
            vec![debit(AccountId::new(), dec!(100)), credit(AccountId::new(), dec!(99.99))],
        );
        assert!(matches!(
            LedgerService::post(&e, 0, UserId::new(), Utc::now()),
            Err(LedgerError::Unbalanced { difference, .. }) if difference == dec!(0.01)
        ));
    }

    #[test]
    fn test_void_requires_reason() {
        let e = balanced(JournalEntryType::Expense, date(), dec!(10));
        assert!(matches!(
            LedgerService::void(&e, "  ", UserId::new(), Utc::now()),
            Err(LedgerError::VoidReasonRequired)
        ));
    }

    #[test]
    fn test_void_posted_entry_keeps_lines() {
        let mut e = balanced(JournalEntryType::Expense, date(), dec!(10));
        e.is_posted = true;
        let action = LedgerService::void(&e, "duplicate", UserId::new(), Utc::now()).unwrap();
        action.apply(&mut e);
        assert!(e.is_voided);
        assert_eq!(e.void_reason.as_deref(), Some("duplicate"));
        assert_eq!(e.lines.len(), 2);
        assert!(!e.is_effective());

        assert!(matches!(
            LedgerService::void(&e, "again", UserId::new(), Utc::now()),
            Err(LedgerError::EntryVoided)
        ));
    }
}
