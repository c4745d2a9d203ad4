//! `SeaORM` Entity for remediation_plans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "remediation_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub reference: String,
    pub application: String,
    pub application_type: Option<String>,
    pub audit_type: String,
    pub security_level: Option<String>,
    pub realised_on: Date,
    pub closed_on: Option<Date>,
    pub reported_on: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub remediation_rate: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub security_comment: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub project_comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vulnerabilities::Entity")]
    Vulnerabilities,
}

impl Related<super::vulnerabilities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vulnerabilities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
