//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod approval_requests;
pub mod approval_rules;
pub mod audit_logs;
pub mod bank_accounts;
pub mod bank_statement_lines;
pub mod bank_statements;
pub mod journal_entries;
pub mod journal_lines;
pub mod sea_orm_active_enums;
