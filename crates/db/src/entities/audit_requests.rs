//! `SeaORM` Entity for audit_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RequestStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: RequestStatus,
    pub requester_email: String,
    pub application_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub application_type: String,
    pub target_url: String,
    pub planned_date: Option<Date>,
    /// Sealed test accounts, `[{identifier, sealed_secret}]`.
    #[sea_orm(column_type = "JsonBinary")]
    pub test_accounts: Json,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_comment: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::assignments::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::audits::Entity")]
    Audits,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::audits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
