//! Bulk reassignment of sales records and employee profiles between regional units.
//!
//! A migration is previewed in COUNT mode and committed in EXECUTE mode. The two
//! bulk updates run one after the other and are not atomic as a pair: when the
//! profile update fails after the sales update succeeded, the sales rows stay
//! migrated and the error names the profiles table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{CallerIdentity, MigrationAuthorizer},
    db::DbPool,
    entities::edit_history::Model as EditHistoryEntry,
    errors::{MigrationTable, ServiceError},
    repositories::{
        sales_record_repository::DateRange, EditHistoryRepository, EmployeeProfileRepository,
        NewEditEntry, RegionalUnitRepository, SalesRecordRepository,
    },
    services::period_clock::{Clock, PeriodKey},
};

/// `table_name` written on every migration audit entry.
pub const AUDIT_TABLE: &str = "regionales";
/// `field_changed` written on every migration audit entry.
pub const AUDIT_FIELD: &str = "migracion_regional";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    Count,
    Execute,
}

/// Migration request as submitted by the caller; validated before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub source_regional_id: Option<String>,
    pub target_regional_id: Option<String>,
    pub source_external_code: Option<i32>,
    pub target_external_code: Option<i32>,
    #[serde(default)]
    pub deactivate_source: bool,
    pub filter_month: Option<u32>,
    pub filter_year: Option<i32>,
}

/// Validated migration inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationScope {
    pub source_regional_id: String,
    pub target_regional_id: String,
    pub source_external_code: i32,
    pub target_external_code: i32,
    pub deactivate_source: bool,
    /// Month whose sales are migrated; `None` migrates all sales.
    pub period: Option<PeriodKey>,
}

impl MigrationScope {
    fn date_range(&self) -> Option<DateRange> {
        self.period.and_then(PeriodKey::date_range)
    }

    fn scope_label(&self) -> String {
        self.period
            .map(|key| key.to_string())
            .unwrap_or_else(|| "all".to_string())
    }
}

fn required_id(value: &Option<String>, field: &str) -> Result<String, ServiceError> {
    match value.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ServiceError::invalid_argument(format!("{} is required", field))),
    }
}

fn required_code(value: Option<i32>, field: &str) -> Result<i32, ServiceError> {
    value.ok_or_else(|| ServiceError::invalid_argument(format!("{} is required", field)))
}

impl MigrationRequest {
    pub fn validate(&self) -> Result<MigrationScope, ServiceError> {
        let source_regional_id = required_id(&self.source_regional_id, "source_regional_id")?;
        let target_regional_id = required_id(&self.target_regional_id, "target_regional_id")?;
        let source_external_code =
            required_code(self.source_external_code, "source_external_code")?;
        let target_external_code =
            required_code(self.target_external_code, "target_external_code")?;

        let period = match (self.filter_month, self.filter_year) {
            (None, None) => None,
            (Some(month), Some(year)) => {
                let key = PeriodKey::new(month, year).ok_or_else(|| {
                    ServiceError::invalid_argument(format!(
                        "filter_month must be between 1 and 12, got {}",
                        month
                    ))
                })?;
                if key.date_range().is_none() {
                    return Err(ServiceError::invalid_argument(format!(
                        "filter_year {} is out of range",
                        year
                    )));
                }
                Some(key)
            }
            _ => {
                return Err(ServiceError::invalid_argument(
                    "filter_month and filter_year must be given together",
                ))
            }
        };

        Ok(MigrationScope {
            source_regional_id,
            target_regional_id,
            source_external_code,
            target_external_code,
            deactivate_source: self.deactivate_source,
            period,
        })
    }
}

/// Rows a migration is expected to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationCounts {
    pub sales_count: u64,
    pub profiles_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Baseline sales count captured before the updates ran.
    pub sales_migrated: u64,
    /// Baseline profile count captured before the updates ran.
    pub profiles_migrated: u64,
    pub deactivated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Counted(MigrationCounts),
    Executed(MigrationResult),
}

/// Preview produced by COUNT, required to commit through
/// [`RegionalMigrationService::execute_plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    scope: MigrationScope,
    counts: MigrationCounts,
    planned_at: DateTime<Utc>,
}

impl MigrationPlan {
    pub fn scope(&self) -> &MigrationScope {
        &self.scope
    }

    pub fn counts(&self) -> MigrationCounts {
        self.counts
    }

    pub fn planned_at(&self) -> DateTime<Utc> {
        self.planned_at
    }
}

/// Service for reassigning regional data
#[derive(Clone)]
pub struct RegionalMigrationService {
    authorizer: MigrationAuthorizer,
    sales: SalesRecordRepository,
    profiles: EmployeeProfileRepository,
    regionals: RegionalUnitRepository,
    history: EditHistoryRepository,
    clock: Arc<dyn Clock>,
}

impl RegionalMigrationService {
    pub fn new(db_pool: Arc<DbPool>, authorizer: MigrationAuthorizer, clock: Arc<dyn Clock>) -> Self {
        Self {
            authorizer,
            sales: SalesRecordRepository::new(db_pool.clone()),
            profiles: EmployeeProfileRepository::new(db_pool.clone()),
            regionals: RegionalUnitRepository::new(db_pool.clone()),
            history: EditHistoryRepository::new(db_pool),
            clock,
        }
    }

    fn authorize(&self, caller: &CallerIdentity) -> Result<(), ServiceError> {
        if self.authorizer.can_migrate(caller) {
            Ok(())
        } else {
            warn!(user_id = %caller.user_id, "Regional migration denied");
            Err(ServiceError::permission_denied())
        }
    }

    /// Single entry point: COUNT previews, EXECUTE commits.
    #[instrument(skip(self, request), fields(user_id = %caller.user_id))]
    pub async fn migrate(
        &self,
        caller: &CallerIdentity,
        request: &MigrationRequest,
        mode: MigrationMode,
    ) -> Result<MigrationOutcome, ServiceError> {
        self.authorize(caller)?;
        let scope = request.validate()?;

        match mode {
            MigrationMode::Count => Ok(MigrationOutcome::Counted(self.count(&scope).await?)),
            MigrationMode::Execute => Ok(MigrationOutcome::Executed(
                self.execute(caller, &scope).await?,
            )),
        }
    }

    /// Runs COUNT and wraps the result in a plan for [`execute_plan`](Self::execute_plan).
    #[instrument(skip(self, request), fields(user_id = %caller.user_id))]
    pub async fn plan(
        &self,
        caller: &CallerIdentity,
        request: &MigrationRequest,
    ) -> Result<MigrationPlan, ServiceError> {
        self.authorize(caller)?;
        let scope = request.validate()?;
        let counts = self.count(&scope).await?;
        Ok(MigrationPlan {
            scope,
            counts,
            planned_at: self.clock.now(),
        })
    }

    /// Commits a previewed plan.
    #[instrument(skip(self, plan), fields(user_id = %caller.user_id))]
    pub async fn execute_plan(
        &self,
        caller: &CallerIdentity,
        plan: &MigrationPlan,
    ) -> Result<MigrationResult, ServiceError> {
        self.authorize(caller)?;
        self.execute_with_expected(caller, &plan.scope, Some(plan.counts))
            .await
    }

    /// Audit entries written for migrations out of `source_regional_id`, newest first.
    pub async fn migration_history(
        &self,
        source_regional_id: &str,
    ) -> Result<Vec<EditHistoryEntry>, ServiceError> {
        Ok(self
            .history
            .list_for(AUDIT_TABLE, source_regional_id, AUDIT_FIELD)
            .await?)
    }

    async fn count(&self, scope: &MigrationScope) -> Result<MigrationCounts, ServiceError> {
        let sales_count = self
            .sales
            .count_in_region(scope.source_external_code, scope.date_range())
            .await?;
        // Profiles are never date scoped.
        let profiles_count = self
            .profiles
            .count_in_regional(&scope.source_regional_id)
            .await?;

        Ok(MigrationCounts {
            sales_count,
            profiles_count,
        })
    }

    async fn execute(
        &self,
        caller: &CallerIdentity,
        scope: &MigrationScope,
    ) -> Result<MigrationResult, ServiceError> {
        self.execute_with_expected(caller, scope, None).await
    }

    async fn execute_with_expected(
        &self,
        caller: &CallerIdentity,
        scope: &MigrationScope,
        expected: Option<MigrationCounts>,
    ) -> Result<MigrationResult, ServiceError> {
        let baseline = self.count(scope).await?;
        if let Some(expected) = expected {
            if expected != baseline {
                warn!(
                    ?expected,
                    ?baseline,
                    "Row counts changed since the migration was planned"
                );
            }
        }

        let sales_updated = self
            .sales
            .reassign_region(
                scope.source_external_code,
                scope.target_external_code,
                scope.date_range(),
            )
            .await
            .map_err(|e| {
                error!(
                    source_code = scope.source_external_code,
                    error = %e,
                    "Sales record reassignment failed; nothing was migrated"
                );
                ServiceError::migration_failed(MigrationTable::Sales, e)
            })?;

        let profiles_updated = self
            .profiles
            .reassign_regional(&scope.source_regional_id, &scope.target_regional_id)
            .await
            .map_err(|e| {
                error!(
                    source_id = %scope.source_regional_id,
                    sales_updated,
                    error = %e,
                    "Employee profile reassignment failed after sales were migrated"
                );
                ServiceError::migration_failed(MigrationTable::Profiles, e)
            })?;

        let deactivated = if scope.deactivate_source {
            self.deactivate_source(&scope.source_regional_id).await
        } else {
            false
        };

        let entry = audit_entry(caller, scope, baseline, deactivated);
        self.history
            .append(entry, self.clock.now())
            .await
            .map_err(|e| {
                error!(
                    source_id = %scope.source_regional_id,
                    error = %e,
                    "Regional migration applied but the audit entry was not written"
                );
                ServiceError::migration_failed(MigrationTable::AuditLog, e)
            })?;

        info!(
            source_code = scope.source_external_code,
            target_code = scope.target_external_code,
            scope = %scope.scope_label(),
            sales_updated,
            profiles_updated,
            deactivated,
            "Regional migration executed"
        );

        Ok(MigrationResult {
            sales_migrated: baseline.sales_count,
            profiles_migrated: baseline.profiles_count,
            deactivated,
        })
    }

    /// Best effort: failures are logged and reported as `false`.
    async fn deactivate_source(&self, source_regional_id: &str) -> bool {
        match self.regionals.deactivate(source_regional_id).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    source_id = %source_regional_id,
                    "Source regional unit not found; nothing deactivated"
                );
                false
            }
            Err(e) => {
                warn!(
                    source_id = %source_regional_id,
                    error = %e,
                    "Failed to deactivate source regional unit"
                );
                false
            }
        }
    }
}

fn audit_entry(
    caller: &CallerIdentity,
    scope: &MigrationScope,
    counts: MigrationCounts,
    deactivated: bool,
) -> NewEditEntry {
    let mut new_value = format!(
        "regional {} ({}); sales={}; profiles={}; scope={}",
        scope.target_external_code,
        scope.target_regional_id,
        counts.sales_count,
        counts.profiles_count,
        scope.scope_label()
    );
    if deactivated {
        new_value.push_str("; source deactivated");
    }

    NewEditEntry {
        table_name: AUDIT_TABLE.to_string(),
        record_id: scope.source_regional_id.clone(),
        field_changed: AUDIT_FIELD.to_string(),
        previous_value: format!(
            "regional {} ({})",
            scope.source_external_code, scope.source_regional_id
        ),
        new_value,
        performed_by: caller.user_id,
    }
}
