//! `SeaORM` Entity for audits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use auditdesk_core::lifecycle::AuditState;

use super::sea_orm_active_enums::AuditStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "audits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub audit_request_id: Uuid,
    pub assignment_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub status: AuditStatus,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub accumulated_duration: Decimal,
    pub active_interval_start: Option<DateTimeWithTimeZone>,
    pub last_pause_time: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Time-accounting state of this row.
    #[must_use]
    pub fn state(&self) -> AuditState {
        AuditState {
            status: self.status.into(),
            accumulated_duration: self.accumulated_duration,
            active_interval_start: self.active_interval_start.map(|t| t.to_utc()),
            last_pause_time: self.last_pause_time.map(|t| t.to_utc()),
        }
    }
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
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignments,
    #[sea_orm(
        belongs_to = "super::providers::Entity",
        from = "Column::ProviderId",
        to = "super::providers::Column::Id"
    )]
    Providers,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::audit_auditors::Entity")]
    AuditAuditors,
}

impl Related<super::audit_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditRequests.def()
    }
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Providers.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::auditors::Entity> for Entity {
    fn to() -> RelationDef {
        super::audit_auditors::Relation::Auditors.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::audit_auditors::Relation::Audits.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
