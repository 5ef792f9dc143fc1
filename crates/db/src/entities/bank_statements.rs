//! `SeaORM` Entity for bank_statements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StatementStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_statements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub statement_date: Date,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub closing_balance: Decimal,
    pub status: StatementStatus,
    pub reconciled_by: Option<Uuid>,
    pub reconciled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id"
    )]
    BankAccounts,
    #[sea_orm(has_many = "super::bank_statement_lines::Entity")]
    BankStatementLines,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl Related<super::bank_statement_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankStatementLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
