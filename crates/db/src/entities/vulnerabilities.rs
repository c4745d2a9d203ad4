//! `SeaORM` Entity for vulnerabilities table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VulnerabilitySeverity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vulnerabilities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub severity: VulnerabilitySeverity,
    pub remediation_status: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::remediation_plans::Entity",
        from = "Column::PlanId",
        to = "super::remediation_plans::Column::Id",
        on_delete = "Cascade"
    )]
    RemediationPlans,
}

impl Related<super::remediation_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemediationPlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
