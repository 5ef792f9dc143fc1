//! Core business logic for Bursar, the school finance ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state transitions live here; the
//! `bursar-db` crate executes the resulting actions atomically.
//!
//! # Modules
//!
//! - `ledger` - Chart of accounts, journal entries, posting, voiding, balances
//! - `workflow` - Approval rule engine and approval request state machine
//! - `reconciliation` - Bank statement import, matching, and close-out
//! - `audit` - Audit events emitted by every state change

pub mod audit;
pub mod ledger;
pub mod reconciliation;
pub mod workflow;
