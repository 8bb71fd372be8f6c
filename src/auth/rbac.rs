/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Roles are reported by the identity provider as plain strings. Only the
 * roles listed in [`MIGRATION_ROLES`] may run a regional migration.
 */

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::warn;
use uuid::Uuid;

/// Roles known to the dashboard
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    RegionalCoordinator,
    Supervisor,
    Seller,
    Viewer,
}

/// Roles allowed to reassign sales and profiles between regional units.
pub const MIGRATION_ROLES: [Role; 2] = [Role::RegionalCoordinator, Role::Admin];

/// The caller as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    /// `None` when the reported role string is not a known role.
    pub role: Option<Role>,
}

impl CallerIdentity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role: Some(role),
        }
    }

    /// Builds an identity from the raw role string of the identity provider.
    pub fn from_reported_role(user_id: Uuid, reported_role: &str) -> Self {
        let role = Role::from_str(reported_role.trim()).ok();
        if role.is_none() {
            warn!(%user_id, "Unknown role reported by identity provider");
        }
        Self { user_id, role }
    }
}

/// Capability check for the regional migration operation
#[derive(Debug, Clone, Default)]
pub struct MigrationAuthorizer;

impl MigrationAuthorizer {
    pub fn new() -> Self {
        Self
    }

    pub fn can_migrate(&self, identity: &CallerIdentity) -> bool {
        identity
            .role
            .map(|role| MIGRATION_ROLES.contains(&role))
            .unwrap_or(false)
    }
}
