//! `SeaORM` Entity for comments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub audit_id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::audits::Entity",
        from = "Column::AuditId",
        to = "super::audits::Column::Id",
        on_delete = "Cascade"
    )]
    Audits,
}

impl Related<super::audits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
