use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employee_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    /// References `regionales.id`.
    pub regional_id: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::regional_unit::Entity",
        from = "Column::RegionalId",
        to = "super::regional_unit::Column::Id"
    )]
    RegionalUnit,
}

impl Related<super::regional_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegionalUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
