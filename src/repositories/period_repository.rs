use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::period::{
    ActiveModel as PeriodActiveModel, Column, Entity as Period, Model as PeriodModel, PeriodState,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Frozen totals written when a period is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingTotals {
    pub total_records: i64,
    pub total_amount: Decimal,
}

/// Storage for period rows, keyed by `(month, year)`.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    base: BaseRepository,
}

impl PeriodRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn key(month: i32, year: i32) -> Condition {
        Condition::all()
            .add(Column::Month.eq(month))
            .add(Column::Year.eq(year))
    }

    /// Point lookup by `(month, year)`
    pub async fn find(&self, month: i32, year: i32) -> Result<Option<PeriodModel>, ServiceError> {
        Ok(Period::find()
            .filter(Self::key(month, year))
            .one(self.base.get_db())
            .await?)
    }

    /// Inserts an OPEN period unless a row for `(month, year)` already exists.
    ///
    /// Returns `true` when this call created the row.
    pub async fn insert_if_absent(
        &self,
        month: i32,
        year: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let inserted = Period::insert(PeriodActiveModel::open(month, year, now))
            .on_conflict(
                OnConflict::columns([Column::Month, Column::Year])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.base.get_db())
            .await?;
        Ok(inserted > 0)
    }

    /// Moves an OPEN period to CLOSED and freezes its totals.
    ///
    /// Returns `false` when no OPEN row matched, leaving any closed row untouched.
    pub async fn close(
        &self,
        month: i32,
        year: i32,
        closed_by: Uuid,
        totals: ClosingTotals,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = Period::update_many()
            .col_expr(Column::State, Expr::value(PeriodState::Closed))
            .col_expr(Column::ClosedAt, Expr::value(now))
            .col_expr(Column::ClosedBy, Expr::value(closed_by))
            .col_expr(Column::TotalRecords, Expr::value(totals.total_records))
            .col_expr(Column::TotalAmount, Expr::value(totals.total_amount))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Self::key(month, year))
            .filter(Column::State.eq(PeriodState::Open))
            .exec(self.base.get_db())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Most recent periods first
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<PeriodModel>, ServiceError> {
        Ok(Period::find()
            .order_by_desc(Column::Year)
            .order_by_desc(Column::Month)
            .limit(limit)
            .all(self.base.get_db())
            .await?)
    }

    /// Periods in the given state, oldest first
    pub async fn find_by_states(
        &self,
        states: Vec<PeriodState>,
    ) -> Result<Vec<PeriodModel>, ServiceError> {
        Ok(Period::find()
            .filter(Column::State.is_in(states))
            .order_by_asc(Column::Year)
            .order_by_asc(Column::Month)
            .all(self.base.get_db())
            .await?)
    }
}
