//! Account repository for chart of accounts database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;

use bursar_core::audit::{AuditAction, AuditEntity, AuditEvent};
use bursar_core::ledger::{Account, LedgerError, NewAccount};
use bursar_shared::types::{AccountId, UserId};

use super::audit::AuditRepository;
use super::is_unique_violation;
use crate::entities::{accounts, journal_lines};

fn db_error(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Account repository for chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists every account ordered by code.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Account::from)
            .collect())
    }

    /// Finds an account by ID.
    pub async fn find_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Account::from)
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Code or name is blank
    /// - Account code already exists
    /// - Parent account does not exist
    /// - Database operation fails
    pub async fn create_account(
        &self,
        input: NewAccount,
        actor: UserId,
    ) -> Result<Account, LedgerError> {
        let code = input.code.trim().to_string();
        let taken = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(&code))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        if taken > 0 {
            return Err(LedgerError::DuplicateAccountCode(code));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = accounts::Entity::find_by_id(parent_id.into_inner())
                .one(&self.db)
                .await
                .map_err(db_error)?;
            if parent.is_none() {
                return Err(LedgerError::AccountNotFound(parent_id));
            }
        }

        let (account, audit) = input.into_account(actor, Utc::now())?;

        let txn = self.db.begin().await.map_err(db_error)?;
        accounts::ActiveModel::from(&account)
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    LedgerError::DuplicateAccountCode(account.code.clone())
                } else {
                    db_error(e)
                }
            })?;
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            account_id = %account.id,
            code = %account.code,
            account_type = %account.account_type.as_str(),
            "Account created"
        );
        Ok(account)
    }

    /// Deletes an account nothing refers to.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Account not found
    /// - Account is a system account
    /// - Account has journal lines or child accounts
    pub async fn delete_account(&self, id: AccountId, actor: UserId) -> Result<(), LedgerError> {
        let account = self.find_account(id).await?;

        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        let children = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        account.ensure_deletable(lines > 0 || children > 0)?;

        let audit = AuditEvent::new(
            actor,
            AuditAction::AccountDeleted,
            AuditEntity::Account,
            id.into_inner(),
            Utc::now(),
        )
        .with_before(account.snapshot());

        let txn = self.db.begin().await.map_err(db_error)?;
        let result = accounts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(db_error)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(account_id = %id, code = %account.code, "Account deleted");
        Ok(())
    }
}
