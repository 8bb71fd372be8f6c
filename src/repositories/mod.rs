use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod edit_history_repository;
pub mod employee_profile_repository;
pub mod period_repository;
pub mod regional_unit_repository;
pub mod sales_record_repository;

pub use edit_history_repository::{EditHistoryRepository, NewEditEntry};
pub use employee_profile_repository::EmployeeProfileRepository;
pub use period_repository::PeriodRepository;
pub use regional_unit_repository::RegionalUnitRepository;
pub use sales_record_repository::SalesRecordRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
