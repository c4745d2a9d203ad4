//! `SeaORM` Entity for assignment_auditors join table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment_auditors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub assignment_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub auditor_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id",
        on_delete = "Cascade"
    )]
    Assignments,
    #[sea_orm(
        belongs_to = "super::auditors::Entity",
        from = "Column::AuditorId",
        to = "super::auditors::Column::Id",
        on_delete = "Cascade"
    )]
    Auditors,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::auditors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auditors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
