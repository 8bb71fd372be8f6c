use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use std::sync::Arc;

use crate::entities::regional_unit::{Column, Entity as RegionalUnit};
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug, Clone)]
pub struct RegionalUnitRepository {
    base: BaseRepository,
}

impl RegionalUnitRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Marks the unit inactive; returns `false` when no row has this id.
    pub async fn deactivate(&self, id: &str) -> Result<bool, DbErr> {
        let result = RegionalUnit::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .filter(Column::Id.eq(id))
            .exec(self.base.get_db())
            .await?;
        Ok(result.rows_affected > 0)
    }
}
