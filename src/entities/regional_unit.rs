use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organizational region.
///
/// Sales records point at `external_code`, employee profiles point at `id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "regionales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub external_code: i32,
    pub name: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::employee_profile::Entity")]
    EmployeeProfiles,
}

impl Related<super::employee_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
