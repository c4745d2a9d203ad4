//! `SeaORM` Entity for assignments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AssignmentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub audit_request_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub audit_type: String,
    pub assigned_on: Date,
    pub status: AssignmentStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::audit_requests::Entity",
        from = "Column::AuditRequestId",
        to = "super::audit_requests::Column::Id"
    )]
    AuditRequests,
    #[sea_orm(
        belongs_to = "super::providers::Entity",
        from = "Column::ProviderId",
        to = "super::providers::Column::Id"
    )]
    Providers,
    #[sea_orm(has_many = "super::assignment_auditors::Entity")]
    AssignmentAuditors,
}

impl Related<super::audit_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditRequests.def()
    }
}

impl Related<super::providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Providers.def()
    }
}

impl Related<super::auditors::Entity> for Entity {
    fn to() -> RelationDef {
        super::assignment_auditors::Relation::Auditors.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::assignment_auditors::Relation::Assignments.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
