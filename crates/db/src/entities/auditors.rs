//! `SeaORM` Entity for auditors table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auditors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub provider_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::providers::Entity",
        from = "Column::ProviderId",
        to = "super::providers::Column::Id"
    )]
    Providers,
    #[sea_orm(has_many = "super::audit_auditors::Entity")]
    AuditAuditors,
    #[sea_orm(has_many = "super::assignment_auditors::Entity")]
    AssignmentAuditors,
}

impl Related<super::providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Providers.def()
    }
}

impl Related<super::audits::Entity> for Entity {
    fn to() -> RelationDef {
        super::audit_auditors::Relation::Audits.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::audit_auditors::Relation::Auditors.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
