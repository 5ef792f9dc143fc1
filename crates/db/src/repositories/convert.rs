//! Conversions between store rows and core domain records.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::Set;

use bursar_core::ledger::{self, Account, JournalEntry, JournalLine};
use bursar_core::reconciliation::{self, BankAccount, BankStatement, StatementLine};
use bursar_core::workflow::{self, ApprovalRequest, ApprovalRule};
use bursar_shared::types::{
    AccountId, ApprovalRequestId, ApprovalRuleId, BankAccountId, BankStatementId, JournalEntryId,
    JournalLineId, StatementLineId, UserId,
};

use crate::entities::{
    accounts, approval_requests, approval_rules, bank_accounts, bank_statement_lines,
    bank_statements, journal_entries, journal_lines, sea_orm_active_enums as db,
};

/// Maps an active enum to its core counterpart and back, variant by variant.
macro_rules! enum_mapping {
    ($db:ty, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $(<$db>::$variant => <$core>::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $(<$core>::$variant => <$db>::$variant,)+
                }
            }
        }
    };
}

enum_mapping!(db::AccountType, ledger::AccountType, [Asset, Liability, Equity, Revenue, Expense]);
enum_mapping!(db::NormalBalance, ledger::NormalBalance, [Debit, Credit]);
enum_mapping!(
    db::JournalEntryType,
    ledger::JournalEntryType,
    [
        FeePayment,
        Expense,
        Salary,
        Refund,
        OpeningBalance,
        Adjustment,
        AssetPurchase,
        AssetDisposal,
        LoanDisbursement,
        LoanRepayment,
    ]
);
enum_mapping!(
    db::PaymentMethod,
    ledger::PaymentMethod,
    [Cash, BankTransfer, Cheque, MobileMoney, Card, Other]
);
enum_mapping!(db::ApprovalStatus, ledger::ApprovalStatus, [Pending, Approved, Rejected]);
enum_mapping!(db::ApproverRole, workflow::ApproverRole, [Accountant, Bursar, Principal, Admin]);
enum_mapping!(
    db::StatementStatus,
    reconciliation::StatementStatus,
    [Pending, Partial, Reconciled]
);

pub(crate) fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn stamp(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.into()
}

fn user(id: Option<uuid::Uuid>) -> Option<UserId> {
    id.map(UserId::from_uuid)
}

// ============================================================================
// Rows -> domain
// ============================================================================

impl From<accounts::Model> for Account {
    fn from(m: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(m.id),
            code: m.code,
            name: m.name,
            account_type: m.account_type.into(),
            normal_balance: m.normal_balance.into(),
            parent_id: m.parent_id.map(AccountId::from_uuid),
            is_system_account: m.is_system_account,
            is_active: m.is_active,
            created_at: utc(m.created_at),
        }
    }
}

impl From<journal_lines::Model> for JournalLine {
    fn from(m: journal_lines::Model) -> Self {
        Self {
            id: JournalLineId::from_uuid(m.id),
            entry_id: JournalEntryId::from_uuid(m.entry_id),
            account_id: AccountId::from_uuid(m.account_id),
            debit_amount: m.debit_amount,
            credit_amount: m.credit_amount,
            memo: m.memo,
        }
    }
}

/// Assembles a journal entry from its row and line rows.
pub(crate) fn entry_from_rows(
    m: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> JournalEntry {
    JournalEntry {
        id: JournalEntryId::from_uuid(m.id),
        reference: m.reference,
        entry_date: m.entry_date,
        entry_type: m.entry_type.into(),
        description: m.description,
        student_id: m.student_id,
        staff_id: m.staff_id,
        term_id: m.term_id,
        payment_method: m.payment_method.map(Into::into),
        created_by: UserId::from_uuid(m.created_by),
        created_at: utc(m.created_at),
        is_posted: m.is_posted,
        posted_by: user(m.posted_by),
        posted_at: m.posted_at.map(utc),
        approval_status: m.approval_status.into(),
        approved_by: user(m.approved_by),
        approved_at: m.approved_at.map(utc),
        is_voided: m.is_voided,
        voided_by: user(m.voided_by),
        voided_at: m.voided_at.map(utc),
        void_reason: m.void_reason,
        lines: lines.into_iter().map(Into::into).collect(),
    }
}

impl From<approval_rules::Model> for ApprovalRule {
    fn from(m: approval_rules::Model) -> Self {
        Self {
            id: ApprovalRuleId::from_uuid(m.id),
            name: m.name,
            transaction_type: m.transaction_type.into(),
            min_amount: m.min_amount,
            max_amount: m.max_amount,
            min_age_days: m.min_age_days,
            required_approver_role: m.required_approver_role.into(),
            is_active: m.is_active,
            created_at: utc(m.created_at),
        }
    }
}

impl From<approval_requests::Model> for ApprovalRequest {
    fn from(m: approval_requests::Model) -> Self {
        Self {
            id: ApprovalRequestId::from_uuid(m.id),
            entry_id: JournalEntryId::from_uuid(m.entry_id),
            rule_id: ApprovalRuleId::from_uuid(m.rule_id),
            status: m.status.into(),
            requested_by: UserId::from_uuid(m.requested_by),
            requested_at: utc(m.requested_at),
            reviewed_by: user(m.reviewed_by),
            reviewed_at: m.reviewed_at.map(utc),
            review_notes: m.review_notes,
            required_approver_role: m.required_approver_role.into(),
        }
    }
}

impl From<bank_accounts::Model> for BankAccount {
    fn from(m: bank_accounts::Model) -> Self {
        Self {
            id: BankAccountId::from_uuid(m.id),
            account_name: m.account_name,
            account_number: m.account_number,
            bank_name: m.bank_name,
            branch: m.branch,
            current_balance: m.current_balance,
            is_active: m.is_active,
            created_at: utc(m.created_at),
        }
    }
}

impl From<bank_statements::Model> for BankStatement {
    fn from(m: bank_statements::Model) -> Self {
        Self {
            id: BankStatementId::from_uuid(m.id),
            bank_account_id: BankAccountId::from_uuid(m.bank_account_id),
            statement_date: m.statement_date,
            period_start: m.period_start,
            period_end: m.period_end,
            opening_balance: m.opening_balance,
            closing_balance: m.closing_balance,
            status: m.status.into(),
            reconciled_by: user(m.reconciled_by),
            reconciled_at: m.reconciled_at.map(utc),
            created_at: utc(m.created_at),
        }
    }
}

impl From<bank_statement_lines::Model> for StatementLine {
    fn from(m: bank_statement_lines::Model) -> Self {
        Self {
            id: StatementLineId::from_uuid(m.id),
            statement_id: BankStatementId::from_uuid(m.statement_id),
            line_date: m.line_date,
            description: m.description,
            reference: m.reference,
            debit_amount: m.debit_amount,
            credit_amount: m.credit_amount,
            running_balance: m.running_balance,
            is_matched: m.is_matched,
            matched_transaction_id: m.matched_transaction_id.map(JournalEntryId::from_uuid),
            matched_by: user(m.matched_by),
            matched_at: m.matched_at.map(utc),
        }
    }
}

// ============================================================================
// Domain -> rows for insertion
// ============================================================================

impl From<&Account> for accounts::ActiveModel {
    fn from(a: &Account) -> Self {
        Self {
            id: Set(a.id.into_inner()),
            code: Set(a.code.clone()),
            name: Set(a.name.clone()),
            account_type: Set(a.account_type.into()),
            normal_balance: Set(a.normal_balance.into()),
            parent_id: Set(a.parent_id.map(AccountId::into_inner)),
            is_system_account: Set(a.is_system_account),
            is_active: Set(a.is_active),
            created_at: Set(stamp(a.created_at)),
        }
    }
}

impl From<&JournalEntry> for journal_entries::ActiveModel {
    fn from(e: &JournalEntry) -> Self {
        Self {
            id: Set(e.id.into_inner()),
            reference: Set(e.reference.clone()),
            entry_date: Set(e.entry_date),
            entry_type: Set(e.entry_type.into()),
            description: Set(e.description.clone()),
            student_id: Set(e.student_id),
            staff_id: Set(e.staff_id),
            term_id: Set(e.term_id),
            payment_method: Set(e.payment_method.map(Into::into)),
            created_by: Set(e.created_by.into_inner()),
            created_at: Set(stamp(e.created_at)),
            is_posted: Set(e.is_posted),
            posted_by: Set(e.posted_by.map(UserId::into_inner)),
            posted_at: Set(e.posted_at.map(stamp)),
            approval_status: Set(e.approval_status.into()),
            approved_by: Set(e.approved_by.map(UserId::into_inner)),
            approved_at: Set(e.approved_at.map(stamp)),
            is_voided: Set(e.is_voided),
            voided_by: Set(e.voided_by.map(UserId::into_inner)),
            voided_at: Set(e.voided_at.map(stamp)),
            void_reason: Set(e.void_reason.clone()),
        }
    }
}

impl From<&JournalLine> for journal_lines::ActiveModel {
    fn from(l: &JournalLine) -> Self {
        Self {
            id: Set(l.id.into_inner()),
            entry_id: Set(l.entry_id.into_inner()),
            account_id: Set(l.account_id.into_inner()),
            debit_amount: Set(l.debit_amount),
            credit_amount: Set(l.credit_amount),
            memo: Set(l.memo.clone()),
        }
    }
}

impl From<&ApprovalRule> for approval_rules::ActiveModel {
    fn from(r: &ApprovalRule) -> Self {
        Self {
            id: Set(r.id.into_inner()),
            name: Set(r.name.clone()),
            transaction_type: Set(r.transaction_type.into()),
            min_amount: Set(r.min_amount),
            max_amount: Set(r.max_amount),
            min_age_days: Set(r.min_age_days),
            required_approver_role: Set(r.required_approver_role.into()),
            is_active: Set(r.is_active),
            created_at: Set(stamp(r.created_at)),
        }
    }
}

impl From<&ApprovalRequest> for approval_requests::ActiveModel {
    fn from(r: &ApprovalRequest) -> Self {
        Self {
            id: Set(r.id.into_inner()),
            entry_id: Set(r.entry_id.into_inner()),
            rule_id: Set(r.rule_id.into_inner()),
            status: Set(r.status.into()),
            requested_by: Set(r.requested_by.into_inner()),
            requested_at: Set(stamp(r.requested_at)),
            reviewed_by: Set(r.reviewed_by.map(UserId::into_inner)),
            reviewed_at: Set(r.reviewed_at.map(stamp)),
            review_notes: Set(r.review_notes.clone()),
            required_approver_role: Set(r.required_approver_role.into()),
        }
    }
}

impl From<&BankAccount> for bank_accounts::ActiveModel {
    fn from(a: &BankAccount) -> Self {
        Self {
            id: Set(a.id.into_inner()),
            account_name: Set(a.account_name.clone()),
            account_number: Set(a.account_number.clone()),
            bank_name: Set(a.bank_name.clone()),
            branch: Set(a.branch.clone()),
            current_balance: Set(a.current_balance),
            is_active: Set(a.is_active),
            created_at: Set(stamp(a.created_at)),
        }
    }
}

impl From<&BankStatement> for bank_statements::ActiveModel {
    fn from(s: &BankStatement) -> Self {
        Self {
            id: Set(s.id.into_inner()),
            bank_account_id: Set(s.bank_account_id.into_inner()),
            statement_date: Set(s.statement_date),
            period_start: Set(s.period_start),
            period_end: Set(s.period_end),
            opening_balance: Set(s.opening_balance),
            closing_balance: Set(s.closing_balance),
            status: Set(s.status.into()),
            reconciled_by: Set(s.reconciled_by.map(UserId::into_inner)),
            reconciled_at: Set(s.reconciled_at.map(stamp)),
            created_at: Set(stamp(s.created_at)),
        }
    }
}

impl From<&StatementLine> for bank_statement_lines::ActiveModel {
    fn from(l: &StatementLine) -> Self {
        Self {
            id: Set(l.id.into_inner()),
            statement_id: Set(l.statement_id.into_inner()),
            line_date: Set(l.line_date),
            description: Set(l.description.clone()),
            reference: Set(l.reference.clone()),
            debit_amount: Set(l.debit_amount),
            credit_amount: Set(l.credit_amount),
            running_balance: Set(l.running_balance),
            is_matched: Set(l.is_matched),
            matched_transaction_id: Set(l.matched_transaction_id.map(JournalEntryId::into_inner)),
            matched_by: Set(l.matched_by.map(UserId::into_inner)),
            matched_at: Set(l.matched_at.map(stamp)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bursar_core::ledger::JournalEntryType;

    #[test]
    fn test_entry_types_map_both_ways() {
        for t in JournalEntryType::ALL {
            let row: db::JournalEntryType = t.into();
            assert_eq!(JournalEntryType::from(row), t);
        }
    }

    #[test]
    fn test_timestamps_round_trip() {
        let now = Utc::now();
        assert_eq!(utc(stamp(now)), now);
    }
}
