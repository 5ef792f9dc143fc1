//! `SeaORM` Entity for bank_statement_lines table.
//!
//! `matched_transaction_id` is a weak reference to a journal entry; a partial
//! unique index keeps one line per transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_statement_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub statement_id: Uuid,
    pub line_date: Date,
    pub description: String,
    pub reference: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub debit_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub credit_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub running_balance: Option<Decimal>,
    pub is_matched: bool,
    pub matched_transaction_id: Option<Uuid>,
    pub matched_by: Option<Uuid>,
    pub matched_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_statements::Entity",
        from = "Column::StatementId",
        to = "super::bank_statements::Column::Id",
        on_delete = "Cascade"
    )]
    BankStatements,
}

impl Related<super::bank_statements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankStatements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
