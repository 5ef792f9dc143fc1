//! Bank reconciliation domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use bursar_shared::ReconciliationConfig;
use bursar_shared::types::{
    BankAccountId, BankStatementId, JournalEntryId, StatementLineId, UserId,
};

use super::error::ReconciliationError;
use crate::ledger::{JournalEntry, JournalEntryType, PaymentMethod};

/// A bank account the school holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique identifier.
    pub id: BankAccountId,
    /// Account holder name as the bank shows it.
    pub account_name: String,
    /// Bank account number (unique).
    pub account_number: String,
    /// Bank name.
    pub bank_name: String,
    /// Optional branch.
    pub branch: Option<String>,
    /// Closing balance of the last reconciled statement.
    pub current_balance: Decimal,
    /// Whether the account is in use.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBankAccount {
    /// Account holder name.
    pub account_name: String,
    /// Bank account number.
    pub account_number: String,
    /// Bank name.
    pub bank_name: String,
    /// Optional branch.
    pub branch: Option<String>,
}

impl NewBankAccount {
    /// Validates the input, collecting every failure.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.account_name.trim().is_empty() {
            errors.push("Account name is required".to_string());
        }
        if self.account_number.trim().is_empty() {
            errors.push("Account number is required".to_string());
        }
        if self.bank_name.trim().is_empty() {
            errors.push("Bank name is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Reconciliation state of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    /// No line matched yet.
    Pending,
    /// At least one line matched.
    Partial,
    /// Closed out. Terminal.
    Reconciled,
}

impl StatementStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Reconciled => "reconciled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "partial" => Some(Self::Partial),
            "reconciled" => Some(Self::Reconciled),
            _ => None,
        }
    }

    /// Returns true if lines of this statement can no longer change.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Reconciled)
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank statement for one account and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatement {
    /// Unique identifier.
    pub id: BankStatementId,
    /// The account this statement belongs to.
    pub bank_account_id: BankAccountId,
    /// Date the bank issued the statement.
    pub statement_date: NaiveDate,
    /// Optional first day covered.
    pub period_start: Option<NaiveDate>,
    /// Optional last day covered.
    pub period_end: Option<NaiveDate>,
    /// Balance at the start of the statement.
    pub opening_balance: Decimal,
    /// Balance the bank declares at the end of the statement.
    pub closing_balance: Decimal,
    /// Reconciliation state.
    pub status: StatementStatus,
    /// Who reconciled the statement.
    pub reconciled_by: Option<UserId>,
    /// When the statement was reconciled.
    pub reconciled_at: Option<DateTime<Utc>>,
    /// When the statement was created.
    pub created_at: DateTime<Utc>,
}

impl BankStatement {
    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "bank_account_id": self.bank_account_id,
            "statement_date": self.statement_date,
            "opening_balance": self.opening_balance,
            "closing_balance": self.closing_balance,
            "status": self.status,
            "reconciled_by": self.reconciled_by,
        })
    }
}

/// Raw statement header input.
///
/// Amounts and dates arrive as text so that every malformed field can be
/// reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBankStatement {
    /// The account this statement belongs to.
    pub bank_account_id: BankAccountId,
    /// Statement date (`YYYY-MM-DD`).
    pub statement_date: String,
    /// Optional period start (`YYYY-MM-DD`).
    pub period_start: Option<String>,
    /// Optional period end (`YYYY-MM-DD`).
    pub period_end: Option<String>,
    /// Opening balance.
    pub opening_balance: String,
    /// Declared closing balance.
    pub closing_balance: String,
}

/// A single movement on a bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Unique identifier.
    pub id: StatementLineId,
    /// The statement this line belongs to.
    pub statement_id: BankStatementId,
    /// Value date of the movement.
    pub line_date: NaiveDate,
    /// Bank narrative.
    pub description: String,
    /// Optional bank reference.
    pub reference: Option<String>,
    /// Money out of the account.
    pub debit_amount: Decimal,
    /// Money into the account.
    pub credit_amount: Decimal,
    /// Optional running balance reported by the bank.
    pub running_balance: Option<Decimal>,
    /// Whether the line is matched.
    pub is_matched: bool,
    /// The matched journal entry.
    pub matched_transaction_id: Option<JournalEntryId>,
    /// Who matched the line.
    pub matched_by: Option<UserId>,
    /// When the line was matched.
    pub matched_at: Option<DateTime<Utc>>,
}

impl StatementLine {
    /// Magnitude of the movement, compared against the ledger amount.
    #[must_use]
    pub fn statement_amount(&self) -> Decimal {
        (self.credit_amount - self.debit_amount).abs()
    }

    /// Signed effect on the bank balance.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.credit_amount - self.debit_amount
    }

    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "statement_id": self.statement_id,
            "is_matched": self.is_matched,
            "matched_transaction_id": self.matched_transaction_id,
            "matched_by": self.matched_by,
        })
    }
}

/// Raw statement line input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementLineInput {
    /// Line date (`YYYY-MM-DD`).
    pub line_date: String,
    /// Bank narrative.
    pub description: String,
    /// Optional bank reference.
    pub reference: Option<String>,
    /// Money out, if any.
    pub debit_amount: Option<String>,
    /// Money in, if any.
    pub credit_amount: Option<String>,
    /// Optional running balance.
    pub running_balance: Option<String>,
}

/// The ledger side of a potential match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransactionSummary {
    /// The journal entry.
    pub entry_id: JournalEntryId,
    /// Entry reference.
    pub reference: String,
    /// Entry description.
    pub description: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry type.
    pub entry_type: JournalEntryType,
    /// How the money moved.
    pub payment_method: Option<PaymentMethod>,
    /// Entry amount (debit side).
    pub amount: Decimal,
    /// Whether the entry is posted.
    pub is_posted: bool,
    /// Whether the entry is voided.
    pub is_voided: bool,
}

impl TryFrom<&JournalEntry> for LedgerTransactionSummary {
    type Error = ReconciliationError;

    fn try_from(entry: &JournalEntry) -> Result<Self, Self::Error> {
        let amount = entry
            .amount()
            .map_err(|_| ReconciliationError::AmountOverflow)?;
        Ok(Self {
            entry_id: entry.id,
            reference: entry.reference.clone(),
            description: entry.description.clone(),
            entry_date: entry.entry_date,
            entry_type: entry.entry_type,
            payment_method: entry.payment_method,
            amount,
            is_posted: entry.is_posted,
            is_voided: entry.is_voided,
        })
    }
}

/// Matching tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTolerance {
    /// Maximum absolute amount difference.
    pub amount: Decimal,
    /// Maximum absolute day distance (inclusive).
    pub days: i64,
}

impl From<&ReconciliationConfig> for MatchTolerance {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            amount: config.amount_tolerance(),
            days: config.date_tolerance_days,
        }
    }
}
