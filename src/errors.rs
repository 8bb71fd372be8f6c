use sea_orm::error::DbErr;
use serde::Serialize;
use std::fmt;

/// Table touched by a regional migration step.
///
/// Reported inside [`ServiceError::MigrationFailed`] so an operator can tell which
/// partial state the store was left in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationTable {
    Sales,
    Profiles,
    AuditLog,
}

impl fmt::Display for MigrationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sales => "sales records",
            Self::Profiles => "employee profiles",
            Self::AuditLog => "edit history",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Migration failed while updating {table}")]
    MigrationFailed {
        table: MigrationTable,
        #[source]
        source: DbErr,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Generic permission-denied error; never carries request details.
    pub fn permission_denied() -> Self {
        ServiceError::Unauthorized("permission denied".to_string())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn migration_failed(table: MigrationTable, source: DbErr) -> Self {
        ServiceError::MigrationFailed { table, source }
    }

    /// Table that failed, when this is a migration failure.
    pub fn failed_table(&self) -> Option<MigrationTable> {
        match self {
            Self::MigrationFailed { table, .. } => Some(*table),
            _ => None,
        }
    }

    /// Returns the error message suitable for end users.
    /// Storage errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            Self::Unauthorized(_) => "Permission denied".to_string(),
            Self::MigrationFailed { table, .. } => {
                let state = match table {
                    MigrationTable::Sales => "nothing was migrated",
                    MigrationTable::Profiles => {
                        "sales records were already reassigned; employee profiles were not"
                    }
                    MigrationTable::AuditLog => "data was migrated but not audited",
                };
                format!(
                    "Regional migration failed while updating {}; {}",
                    table, state
                )
            }
            _ => self.to_string(),
        }
    }
}
