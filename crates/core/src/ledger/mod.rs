//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts
//! - Journal entries and lines
//! - Balance calculations
//! - Posting validation
//! - Posting and voiding decisions

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, NewAccount};
pub use balance::{AccountBalance, BalanceLine};
pub use entry::{JournalEntry, JournalLine};
pub use error::LedgerError;
pub use service::{LedgerService, PostAction, VoidAction};
pub use types::{
    AccountType, ApprovalStatus, EntryTotals, JournalEntryType, NewJournalEntry, NewJournalLine,
    NormalBalance, PaymentMethod,
};
pub use validation::{is_single_sided, validate_for_posting, validate_new_entry};
