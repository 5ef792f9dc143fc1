//! `SeaORM` Entity for bank_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_name: String,
    #[sea_orm(unique)]
    pub account_number: String,
    pub bank_name: String,
    pub branch: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub current_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bank_statements::Entity")]
    BankStatements,
}

impl Related<super::bank_statements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankStatements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
