//! `SeaORM` Entity for providers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub market_number: Option<String>,
    pub market_subject: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub budget_total: Option<Decimal>,
    pub contract_start: Option<Date>,
    pub contract_end: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub realisation: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub solde: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub annual_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub contract_years: Option<Decimal>,
    pub classes: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub budget_jour_homme: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auditors::Entity")]
    Auditors,
    #[sea_orm(has_many = "super::assignments::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::audits::Entity")]
    Audits,
}

impl Related<super::auditors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auditors.def()
    }
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
