//! Journal entry and journal line domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use bursar_shared::types::{AccountId, JournalEntryId, JournalLineId, UserId};

use super::error::LedgerError;
use super::types::{ApprovalStatus, EntryTotals, JournalEntryType, PaymentMethod};

/// A single line of a journal entry.
///
/// Exactly one of `debit_amount` / `credit_amount` is positive on a valid line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier for this line.
    pub id: JournalLineId,
    /// The entry this line belongs to.
    pub entry_id: JournalEntryId,
    /// The account affected by this line.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit_amount: Decimal,
    /// Credit amount.
    pub credit_amount: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit_amount - self.credit_amount
    }

    /// Returns true if the line carries a debit.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.debit_amount > Decimal::ZERO
    }

    /// Returns true if the line carries a credit.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.credit_amount > Decimal::ZERO
    }
}

/// A journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Unique business reference.
    pub reference: String,
    /// Date of the economic event.
    pub entry_date: NaiveDate,
    /// Kind of event.
    pub entry_type: JournalEntryType,
    /// Free-text description.
    pub description: String,
    /// Optional student reference.
    pub student_id: Option<Uuid>,
    /// Optional staff reference.
    pub staff_id: Option<Uuid>,
    /// Optional term reference.
    pub term_id: Option<Uuid>,
    /// How the money moved.
    pub payment_method: Option<PaymentMethod>,
    /// User who recorded the entry.
    pub created_by: UserId,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
    /// Whether the entry is posted.
    pub is_posted: bool,
    /// Who posted the entry.
    pub posted_by: Option<UserId>,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Approval state of the entry.
    pub approval_status: ApprovalStatus,
    /// Who approved the entry.
    pub approved_by: Option<UserId>,
    /// When the entry was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Whether the entry is voided.
    pub is_voided: bool,
    /// Who voided the entry.
    pub voided_by: Option<UserId>,
    /// When the entry was voided.
    pub voided_at: Option<DateTime<Utc>>,
    /// Why the entry was voided.
    pub void_reason: Option<String>,
    /// The lines of this entry.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Returns true if the entry counts toward balances.
    ///
    /// A voided entry never counts, even if it was posted before voiding.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.is_posted && !self.is_voided
    }

    /// Returns the debit and credit totals of the lines.
    pub fn totals(&self) -> Result<EntryTotals, LedgerError> {
        EntryTotals::from_pairs(
            self.lines
                .iter()
                .map(|l| (l.debit_amount, l.credit_amount)),
        )
    }

    /// The entry amount: the sum of the debit side.
    pub fn amount(&self) -> Result<Decimal, LedgerError> {
        Ok(self.totals()?.debit)
    }

    /// Whole days from the entry date to `today`. Negative for future-dated entries.
    #[must_use]
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.entry_date).num_days()
    }

    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "reference": self.reference,
            "is_posted": self.is_posted,
            "posted_by": self.posted_by,
            "approval_status": self.approval_status,
            "approved_by": self.approved_by,
            "is_voided": self.is_voided,
            "voided_by": self.voided_by,
            "void_reason": self.void_reason,
        })
    }
}
