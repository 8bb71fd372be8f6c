use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::period::{Model as Period, PeriodState},
    errors::ServiceError,
    repositories::{period_repository::ClosingTotals, PeriodRepository, SalesRecordRepository},
    services::period_clock::{self, Clock, PeriodKey},
};

/// Where new data should land right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPeriod {
    pub month: u32,
    pub year: i32,
    /// True while the previous month is still waiting to be closed.
    pub is_closing_day: bool,
}

impl TargetPeriod {
    fn new(key: PeriodKey, is_closing_day: bool) -> Self {
        Self {
            month: key.month,
            year: key.year,
            is_closing_day,
        }
    }
}

/// Sales totals for one month, as frozen on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_records: i64,
    pub total_amount: Decimal,
}

/// Service for the accounting period lifecycle
#[derive(Clone)]
pub struct PeriodService {
    periods: PeriodRepository,
    sales: SalesRecordRepository,
    clock: Arc<dyn Clock>,
}

fn period_key(month: u32, year: i32) -> Result<PeriodKey, ServiceError> {
    PeriodKey::new(month, year).ok_or_else(|| {
        ServiceError::invalid_argument(format!("month must be between 1 and 12, got {}", month))
    })
}

impl PeriodService {
    pub fn new(db_pool: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            periods: PeriodRepository::new(db_pool.clone()),
            sales: SalesRecordRepository::new(db_pool),
            clock,
        }
    }

    /// Reads the period for `(month, year)`, creating it OPEN when absent.
    ///
    /// Racing creators converge on the first committed row.
    #[instrument(skip(self))]
    pub async fn get_or_create_period(&self, month: u32, year: i32) -> Result<Period, ServiceError> {
        let key = period_key(month, year)?;
        let (month, year) = (key.month as i32, key.year);

        if let Some(existing) = self.periods.find(month, year).await? {
            return Ok(existing);
        }

        if self
            .periods
            .insert_if_absent(month, year, self.clock.now())
            .await?
        {
            info!(period = %key, "Created period");
        }

        self.periods.find(month, year).await?.ok_or_else(|| {
            ServiceError::InternalError(format!("period {} missing after insert", key))
        })
    }

    /// Closes an existing period, freezing the supplied totals.
    #[instrument(skip(self))]
    pub async fn close_period(
        &self,
        month: u32,
        year: i32,
        closed_by: Uuid,
        total_records: i64,
        total_amount: Decimal,
    ) -> Result<Period, ServiceError> {
        let key = period_key(month, year)?;
        if total_records < 0 || total_amount.is_sign_negative() {
            return Err(ServiceError::invalid_argument(
                "period totals must not be negative",
            ));
        }
        let (month, year) = (key.month as i32, key.year);

        let existing = self
            .periods
            .find(month, year)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Period {} not found", key)))?;
        if existing.is_closed() {
            return Err(ServiceError::invalid_argument(format!(
                "period {} is already closed",
                key
            )));
        }

        let totals = ClosingTotals {
            total_records,
            total_amount,
        };
        if !self
            .periods
            .close(month, year, closed_by, totals, self.clock.now())
            .await?
        {
            warn!(period = %key, "Period was closed concurrently");
            return Err(ServiceError::invalid_argument(format!(
                "period {} is already closed",
                key
            )));
        }

        let closed = self
            .periods
            .find(month, year)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Period {} not found", key)))?;
        info!(
            period = %key,
            %closed_by,
            total_records,
            total_amount = %total_amount,
            "Closed period"
        );
        Ok(closed)
    }

    /// Absence of a row means "not yet closed".
    #[instrument(skip(self))]
    pub async fn is_period_closed(&self, month: u32, year: i32) -> Result<bool, ServiceError> {
        let key = period_key(month, year)?;
        Ok(self
            .periods
            .find(key.month as i32, key.year)
            .await?
            .map(|period| period.is_closed())
            .unwrap_or(false))
    }

    pub async fn is_accepting_writes(&self, month: u32, year: i32) -> Result<bool, ServiceError> {
        Ok(!self.is_period_closed(month, year).await?)
    }

    /// Period new data entered on `today` belongs to.
    ///
    /// On a closing day whose previous month is already CLOSED, data goes to the
    /// current month and the closing-day flag is cleared.
    #[instrument(skip(self))]
    pub async fn resolve_current_target_period(
        &self,
        today: NaiveDate,
    ) -> Result<TargetPeriod, ServiceError> {
        let target = period_clock::target_period(today);
        let closing_day = period_clock::is_closing_day(today);

        if closing_day && self.is_period_closed(target.month, target.year).await? {
            return Ok(TargetPeriod::new(PeriodKey::of(today), false));
        }

        Ok(TargetPeriod::new(target, closing_day))
    }

    /// [`resolve_current_target_period`](Self::resolve_current_target_period) for the clock's today.
    pub async fn current_target_period(&self) -> Result<TargetPeriod, ServiceError> {
        self.resolve_current_target_period(self.clock.today()).await
    }

    pub async fn get_period(&self, month: u32, year: i32) -> Result<Option<Period>, ServiceError> {
        let key = period_key(month, year)?;
        self.periods.find(key.month as i32, key.year).await
    }

    /// Most recent periods first
    pub async fn list_periods(&self, limit: u64) -> Result<Vec<Period>, ServiceError> {
        self.periods.list_recent(limit).await
    }

    /// Periods still accepting writes, oldest first
    pub async fn open_periods(&self) -> Result<Vec<Period>, ServiceError> {
        self.periods.find_by_states(vec![PeriodState::Open]).await
    }

    /// Counts and sums the sales dated inside the month.
    #[instrument(skip(self))]
    pub async fn compute_period_totals(
        &self,
        month: u32,
        year: i32,
    ) -> Result<PeriodTotals, ServiceError> {
        let key = period_key(month, year)?;
        let range = key
            .date_range()
            .ok_or_else(|| ServiceError::invalid_argument(format!("year {} out of range", year)))?;
        let (total_records, total_amount) = self.sales.totals_between(range).await?;
        Ok(PeriodTotals {
            total_records,
            total_amount,
        })
    }

    /// Get-or-create the period, then close it with totals computed from sales.
    #[instrument(skip(self))]
    pub async fn close_period_with_computed_totals(
        &self,
        month: u32,
        year: i32,
        closed_by: Uuid,
    ) -> Result<Period, ServiceError> {
        self.get_or_create_period(month, year).await?;
        let totals = self.compute_period_totals(month, year).await?;
        self.close_period(
            month,
            year,
            closed_by,
            totals.total_records,
            totals.total_amount,
        )
        .await
    }
}
