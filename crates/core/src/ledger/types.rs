//! Ledger domain types for journal entry creation and classification.
//!
//! This module defines the enums shared by the chart of accounts, journal
//! entries, and the approval workflow, plus the input types used to record a
//! new journal entry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use bursar_shared::types::{AccountId, UserId};

use super::error::LedgerError;

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Things the school owns (cash, bank, receivables).
    Asset,
    /// Things the school owes.
    Liability,
    /// Residual interest.
    Equity,
    /// Tuition, fees, and other income.
    Revenue,
    /// Salaries, utilities, supplies.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// The conventional normal balance for this account type.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Revenue: credit-normal
    #[must_use]
    pub fn default_normal_balance(&self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

/// The side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalBalance {
    /// Balance += debit - credit.
    Debit,
    /// Balance += credit - debit.
    Credit,
}

impl NormalBalance {
    /// Returns the string representation of the normal balance.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a normal balance from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Calculates the balance change a line causes on an account.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// The kind of economic event a journal entry records.
///
/// Approval rules are keyed on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEntryType {
    /// Student fee received.
    FeePayment,
    /// Operating expense paid.
    Expense,
    /// Staff salary paid.
    Salary,
    /// Money returned to a payer.
    Refund,
    /// Opening balance brought forward.
    OpeningBalance,
    /// Correcting or adjusting entry.
    Adjustment,
    /// Fixed asset bought.
    AssetPurchase,
    /// Fixed asset sold or written off.
    AssetDisposal,
    /// Loan proceeds received.
    LoanDisbursement,
    /// Loan principal or interest repaid.
    LoanRepayment,
}

impl JournalEntryType {
    /// All entry types, in display order.
    pub const ALL: [Self; 10] = [
        Self::FeePayment,
        Self::Expense,
        Self::Salary,
        Self::Refund,
        Self::OpeningBalance,
        Self::Adjustment,
        Self::AssetPurchase,
        Self::AssetDisposal,
        Self::LoanDisbursement,
        Self::LoanRepayment,
    ];

    /// Returns the string representation of the entry type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeePayment => "fee_payment",
            Self::Expense => "expense",
            Self::Salary => "salary",
            Self::Refund => "refund",
            Self::OpeningBalance => "opening_balance",
            Self::Adjustment => "adjustment",
            Self::AssetPurchase => "asset_purchase",
            Self::AssetDisposal => "asset_disposal",
            Self::LoanDisbursement => "loan_disbursement",
            Self::LoanRepayment => "loan_repayment",
        }
    }

    /// Parses an entry type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lowered)
    }
}

impl fmt::Display for JournalEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approval state shared by journal entries and approval requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Awaiting review.
    Pending,
    /// Reviewed and approved (terminal for requests).
    Approved,
    /// Reviewed and rejected (terminal for requests).
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once a review has happened.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How money moved for a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer or deposit.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Mobile money wallet.
    MobileMoney,
    /// Card payment.
    Card,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Returns the string representation of the payment method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::MobileMoney => "mobile_money",
            Self::Card => "card",
            Self::Other => "other",
        }
    }

    /// Parses a payment method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank_transfer" => Some(Self::BankTransfer),
            "cheque" => Some(Self::Cheque),
            "mobile_money" => Some(Self::MobileMoney),
            "card" => Some(Self::Card),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns true if the money moved through a bank account.
    #[must_use]
    pub fn is_bank_mediated(&self) -> bool {
        matches!(self, Self::BankTransfer | Self::Cheque)
    }
}

/// Input for a single journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalLine {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero when this is a credit line).
    #[serde(default)]
    pub debit_amount: Decimal,
    /// Credit amount (zero when this is a debit line).
    #[serde(default)]
    pub credit_amount: Decimal,
    /// Optional memo for this line.
    pub memo: Option<String>,
}

/// Input for recording a new, unposted journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Unique reference (receipt number, voucher number).
    pub reference: String,
    /// Date of the economic event.
    pub entry_date: NaiveDate,
    /// Kind of event.
    pub entry_type: JournalEntryType,
    /// Free-text description.
    pub description: String,
    /// Optional student the entry concerns.
    pub student_id: Option<Uuid>,
    /// Optional staff member the entry concerns.
    pub staff_id: Option<Uuid>,
    /// Optional academic term.
    pub term_id: Option<Uuid>,
    /// How the money moved, if it moved.
    pub payment_method: Option<PaymentMethod>,
    /// User recording the entry.
    pub created_by: UserId,
    /// The lines (at least one debit and one credit).
    pub lines: Vec<NewJournalLine>,
}

/// Entry totals for validation and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryTotals {
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Creates new totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Sums debit/credit pairs.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountOverflow`] if either side overflows.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Decimal, Decimal)>,
    ) -> Result<Self, LedgerError> {
        pairs
            .into_iter()
            .try_fold(Self::new(Decimal::ZERO, Decimal::ZERO), |acc, (d, c)| {
                match (acc.debit.checked_add(d), acc.credit.checked_add(c)) {
                    (Some(debit), Some(credit)) => Ok(Self::new(debit, credit)),
                    _ => Err(LedgerError::AmountOverflow),
                }
            })
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}
