//! Account balance calculations.
//!
//! Balances are derived from lines of posted, non-voided entries dated on or
//! before the as-of date:
//! - Debit-normal accounts: balance += debit - credit
//! - Credit-normal accounts: balance += credit - debit

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bursar_shared::types::AccountId;

use super::entry::JournalEntry;
use super::types::NormalBalance;

/// A line amount pair as seen by the balance query.
#[derive(Debug, Clone, Copy)]
pub struct BalanceLine {
    /// Date of the owning entry.
    pub entry_date: NaiveDate,
    /// Whether the owning entry is posted.
    pub is_posted: bool,
    /// Whether the owning entry is voided.
    pub is_voided: bool,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Account balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Normal side used for the signed balance.
    pub normal_balance: NormalBalance,
    /// Balance as of this date (inclusive).
    pub as_of: NaiveDate,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Signed balance on the account's normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: AccountId, normal_balance: NormalBalance, as_of: NaiveDate) -> Self {
        Self {
            account_id,
            normal_balance,
            as_of,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Adds a line to the balance.
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.balance += self.normal_balance.balance_change(debit, credit);
    }

    /// Computes a balance from candidate lines, skipping lines of unposted,
    /// voided, or later-dated entries.
    #[must_use]
    pub fn from_lines(
        account_id: AccountId,
        normal_balance: NormalBalance,
        as_of: NaiveDate,
        lines: impl IntoIterator<Item = BalanceLine>,
    ) -> Self {
        let mut balance = Self::new(account_id, normal_balance, as_of);
        for line in lines {
            if line.is_posted && !line.is_voided && line.entry_date <= as_of {
                balance.add(line.debit, line.credit);
            }
        }
        balance
    }

    /// Computes a balance over whole entries.
    #[must_use]
    pub fn from_entries<'a>(
        account_id: AccountId,
        normal_balance: NormalBalance,
        as_of: NaiveDate,
        entries: impl IntoIterator<Item = &'a JournalEntry>,
    ) -> Self {
        let lines = entries.into_iter().flat_map(|entry| {
            entry
                .lines
                .iter()
                .filter(move |l| l.account_id == account_id)
                .map(move |l| BalanceLine {
                    entry_date: entry.entry_date,
                    is_posted: entry.is_posted,
                    is_voided: entry.is_voided,
                    debit: l.debit_amount,
                    credit: l.credit_amount,
                })
        });
        Self::from_lines(account_id, normal_balance, as_of, lines)
    }
}
