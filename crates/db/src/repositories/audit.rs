//! Append-only audit log.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use bursar_core::audit::{AuditEntity, AuditEvent};

use super::convert::stamp;
use crate::entities::audit_logs;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one event on `conn`, normally the transaction that made the
    /// change.
    pub async fn append<C: ConnectionTrait>(conn: &C, event: &AuditEvent) -> Result<(), DbErr> {
        info!(
            actor_id = %event.actor_id,
            action = %event.action,
            entity = %event.entity,
            entity_id = %event.entity_id,
            "audit"
        );
        audit_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            actor_id: Set(event.actor_id.into_inner()),
            action: Set(event.action.as_str().to_string()),
            entity: Set(event.entity.as_str().to_string()),
            entity_id: Set(event.entity_id),
            before: Set(event.before.clone()),
            after: Set(event.after.clone()),
            created_at: Set(stamp(event.occurred_at)),
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// Appends every event in order.
    pub async fn append_all<C: ConnectionTrait>(
        conn: &C,
        events: &[AuditEvent],
    ) -> Result<(), DbErr> {
        for event in events {
            Self::append(conn, event).await?;
        }
        Ok(())
    }

    /// Lists the history of one record, oldest first.
    pub async fn for_entity(
        &self,
        entity: AuditEntity,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::Entity.eq(entity.as_str()))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.db)
            .await
    }
}
