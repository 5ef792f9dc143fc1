//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::approval_requests::Entity as ApprovalRequests;
pub use super::approval_rules::Entity as ApprovalRules;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::bank_accounts::Entity as BankAccounts;
pub use super::bank_statement_lines::Entity as BankStatementLines;
pub use super::bank_statements::Entity as BankStatements;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
