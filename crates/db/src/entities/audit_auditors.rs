//! `SeaORM` Entity for audit_auditors join table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_auditors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub audit_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub auditor_id: Uuid,
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
    #[sea_orm(
        belongs_to = "super::auditors::Entity",
        from = "Column::AuditorId",
        to = "super::auditors::Column::Id",
        on_delete = "Cascade"
    )]
    Auditors,
}

impl Related<super::audits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audits.def()
    }
}

impl Related<super::auditors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auditors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
