pub mod period_clock;
pub mod periods;
pub mod regional_migration;

pub use period_clock::{Clock, FixedClock, PeriodKey, SystemClock};
pub use periods::{PeriodService, PeriodTotals, TargetPeriod};
pub use regional_migration::{
    MigrationCounts, MigrationMode, MigrationOutcome, MigrationPlan, MigrationRequest,
    MigrationResult, MigrationScope, RegionalMigrationService,
};
