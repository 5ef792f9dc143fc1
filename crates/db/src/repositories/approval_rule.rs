//! Approval rule repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use bursar_core::audit::{AuditAction, AuditEntity, AuditEvent};
use bursar_core::workflow::{ApprovalRule, NewApprovalRule, RuleEngine, WorkflowError};
use bursar_shared::types::{ApprovalRuleId, UserId};

use super::audit::AuditRepository;
use crate::entities::approval_rules;

fn db_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new approval rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active rules in creation order, read on `conn`.
    pub async fn active_rules<C: ConnectionTrait>(conn: &C) -> Result<Vec<ApprovalRule>, DbErr> {
        Ok(approval_rules::Entity::find()
            .filter(approval_rules::Column::IsActive.eq(true))
            .order_by_asc(approval_rules::Column::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(ApprovalRule::from)
            .collect())
    }

    /// Lists every rule, active or not.
    pub async fn list_rules(&self) -> Result<Vec<ApprovalRule>, WorkflowError> {
        Ok(approval_rules::Entity::find()
            .order_by_asc(approval_rules::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(ApprovalRule::from)
            .collect())
    }

    /// Creates a new active rule.
    pub async fn create_rule(
        &self,
        input: NewApprovalRule,
        actor: UserId,
    ) -> Result<ApprovalRule, WorkflowError> {
        let now = Utc::now();
        let rule = input.into_rule(now)?;
        let audit = AuditEvent::new(
            actor,
            AuditAction::RuleCreated,
            AuditEntity::ApprovalRule,
            rule.id.into_inner(),
            now,
        )
        .with_after(rule.snapshot());

        let txn = self.db.begin().await.map_err(db_error)?;
        approval_rules::ActiveModel::from(&rule)
            .insert(&txn)
            .await
            .map_err(db_error)?;
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(
            rule_id = %rule.id,
            name = %rule.name,
            transaction_type = %rule.transaction_type,
            "Approval rule created"
        );
        Ok(rule)
    }

    /// Activates or deactivates a rule. Deactivated rules stop gating new
    /// entries; requests they already opened are unaffected.
    pub async fn set_rule_active(
        &self,
        rule_id: ApprovalRuleId,
        is_active: bool,
        actor: UserId,
    ) -> Result<ApprovalRule, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let existing = approval_rules::Entity::find_by_id(rule_id.into_inner())
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::RuleNotFound(rule_id))?;
        let before = ApprovalRule::from(existing.clone());

        let mut model: approval_rules::ActiveModel = existing.into();
        model.is_active = Set(is_active);
        let rule = ApprovalRule::from(model.update(&txn).await.map_err(db_error)?);

        let audit = AuditEvent::new(
            actor,
            AuditAction::RuleUpdated,
            AuditEntity::ApprovalRule,
            rule_id.into_inner(),
            Utc::now(),
        )
        .with_before(before.snapshot())
        .with_after(rule.snapshot());
        AuditRepository::append(&txn, &audit)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        info!(rule_id = %rule_id, is_active, "Approval rule updated");
        Ok(rule)
    }

    /// Inserts the built-in rules that are not present by name.
    ///
    /// Returns the number of rules created.
    pub async fn ensure_default_rules(&self, actor: UserId) -> Result<usize, WorkflowError> {
        let mut created = 0;
        for input in RuleEngine::default_rules() {
            let exists = approval_rules::Entity::find()
                .filter(approval_rules::Column::Name.eq(&input.name))
                .count(&self.db)
                .await
                .map_err(db_error)?;
            if exists == 0 {
                self.create_rule(input, actor).await?;
                created += 1;
            }
        }
        Ok(created)
    }
}
