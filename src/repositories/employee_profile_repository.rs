use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use std::sync::Arc;

use crate::entities::employee_profile::{Column, Entity as EmployeeProfile};
use crate::repositories::Repository;

use super::BaseRepository;

/// Employee profiles, referenced to a regional unit by its id.
#[derive(Debug, Clone)]
pub struct EmployeeProfileRepository {
    base: BaseRepository,
}

impl EmployeeProfileRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn count_in_regional(&self, regional_id: &str) -> Result<u64, DbErr> {
        EmployeeProfile::find()
            .filter(Column::RegionalId.eq(regional_id))
            .count(self.base.get_db())
            .await
    }

    pub async fn reassign_regional(&self, from_id: &str, to_id: &str) -> Result<u64, DbErr> {
        let result = EmployeeProfile::update_many()
            .col_expr(Column::RegionalId, Expr::value(to_id))
            .filter(Column::RegionalId.eq(from_id))
            .exec(self.base.get_db())
            .await?;
        Ok(result.rows_affected)
    }
}
