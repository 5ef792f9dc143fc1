//! Chart of accounts types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use bursar_shared::types::{AccountId, UserId};

use super::error::LedgerError;
use super::types::{AccountType, NormalBalance};
use crate::audit::{AuditAction, AuditEntity, AuditEvent};

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique account code (e.g. "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Side on which the balance grows.
    pub normal_balance: NormalBalance,
    /// Optional parent account.
    pub parent_id: Option<AccountId>,
    /// System accounts cannot be deleted.
    pub is_system_account: bool,
    /// Inactive accounts cannot receive new lines.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Overrides the type's conventional normal balance.
    pub normal_balance: Option<NormalBalance>,
    /// Optional parent account.
    pub parent_id: Option<AccountId>,
    /// Marks the account as a system account.
    #[serde(default)]
    pub is_system_account: bool,
}

impl NewAccount {
    /// Resolved normal balance for the new account.
    #[must_use]
    pub fn resolved_normal_balance(&self) -> NormalBalance {
        self.normal_balance
            .unwrap_or_else(|| self.account_type.default_normal_balance())
    }

    /// Validates the input, collecting every failure.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let mut errors = Vec::new();
        if self.code.trim().is_empty() {
            errors.push("Account code is required".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("Account name is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(errors))
        }
    }

    /// Validates the input and builds an active account.
    pub fn into_account(
        self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<(Account, AuditEvent), LedgerError> {
        self.validate()?;
        let normal_balance = self.resolved_normal_balance();
        let account = Account {
            id: AccountId::new(),
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            account_type: self.account_type,
            normal_balance,
            parent_id: self.parent_id,
            is_system_account: self.is_system_account,
            is_active: true,
            created_at: now,
        };
        Account::validate_parent(account.id, account.parent_id)?;
        let audit = AuditEvent::new(
            actor,
            AuditAction::AccountCreated,
            AuditEntity::Account,
            account.id.into_inner(),
            now,
        )
        .with_after(account.snapshot());
        Ok((account, audit))
    }
}

impl Account {
    /// State snapshot recorded in the audit log.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "code": self.code,
            "name": self.name,
            "account_type": self.account_type,
            "normal_balance": self.normal_balance,
            "parent_id": self.parent_id,
            "is_system_account": self.is_system_account,
        })
    }

    /// Checks that `parent_id` does not point at the account itself.
    pub fn validate_parent(id: AccountId, parent_id: Option<AccountId>) -> Result<(), LedgerError> {
        if parent_id == Some(id) {
            return Err(LedgerError::SelfParent(id));
        }
        Ok(())
    }

    /// Checks whether the account may be deleted.
    ///
    /// System accounts and accounts referenced by any journal line are kept.
    pub fn ensure_deletable(&self, referenced_by_lines: bool) -> Result<(), LedgerError> {
        if self.is_system_account {
            return Err(LedgerError::SystemAccount(self.id));
        }
        if referenced_by_lines {
            return Err(LedgerError::AccountInUse(self.id));
        }
        Ok(())
    }
}
