use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect,
};
use std::sync::Arc;

use crate::entities::sales_record::{Column, Entity as SalesRecord};
use crate::repositories::Repository;

use super::BaseRepository;

/// Inclusive date bounds applied to `sales_records.date`.
pub type DateRange = (NaiveDate, NaiveDate);

/// Sales rows, referenced to a regional unit by its external code.
#[derive(Debug, Clone)]
pub struct SalesRecordRepository {
    base: BaseRepository,
}

impl SalesRecordRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn in_region(region_code: i32, range: Option<DateRange>) -> Condition {
        let condition = Condition::all().add(Column::RegionCode.eq(region_code));
        match range {
            Some((from, to)) => condition.add(Column::Date.between(from, to)),
            None => condition,
        }
    }

    pub async fn count_in_region(
        &self,
        region_code: i32,
        range: Option<DateRange>,
    ) -> Result<u64, DbErr> {
        SalesRecord::find()
            .filter(Self::in_region(region_code, range))
            .count(self.base.get_db())
            .await
    }

    /// Rewrites `region_code` on every matching row in one statement.
    pub async fn reassign_region(
        &self,
        from_code: i32,
        to_code: i32,
        range: Option<DateRange>,
    ) -> Result<u64, DbErr> {
        let result = SalesRecord::update_many()
            .col_expr(Column::RegionCode, Expr::value(to_code))
            .filter(Self::in_region(from_code, range))
            .exec(self.base.get_db())
            .await?;
        Ok(result.rows_affected)
    }

    /// Row count and amount sum of all sales dated inside `range`.
    pub async fn totals_between(&self, range: DateRange) -> Result<(i64, Decimal), DbErr> {
        let totals: Option<(i64, Option<Decimal>)> = SalesRecord::find()
            .select_only()
            .column_as(Expr::col(Column::Id).count(), "total_records")
            .column_as(Expr::col(Column::Amount).sum(), "total_amount")
            .filter(Column::Date.between(range.0, range.1))
            .into_tuple()
            .one(self.base.get_db())
            .await?;
        // SUM over no rows is NULL
        Ok(totals
            .map(|(records, amount)| (records, amount.unwrap_or(Decimal::ZERO)))
            .unwrap_or((0, Decimal::ZERO)))
    }
}
