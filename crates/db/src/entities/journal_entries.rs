//! `SeaORM` Entity for journal headers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub journal_number: String,
    pub entry_date: Date,
    pub period: String,
    pub year: i32,
    pub entry_type: String,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub description: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
    pub status: String,
    pub is_posted: bool,
    pub is_approved: bool,
    pub is_reversed: bool,
    pub reversal_journal_id: Option<Uuid>,
    pub reversal_of: Option<Uuid>,
    pub reversal_reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub posted_by: Option<String>,
    pub posted_at: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub reversed_by: Option<String>,
    pub reversed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
