//! Field sales period lifecycle and regional data migration.
//!
//! [`services::PeriodService`] decides which accounting month new data belongs to
//! and opens or closes months. [`services::RegionalMigrationService`] moves sales
//! records and employee profiles from one regional unit to another.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use crate::auth::MigrationAuthorizer;
use crate::db::DbPool;
use crate::services::{Clock, PeriodService, RegionalMigrationService};

/// Services wired against one connection pool and clock.
#[derive(Clone)]
pub struct AppServices {
    pub periods: Arc<PeriodService>,
    pub regional_migration: Arc<RegionalMigrationService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            periods: Arc::new(PeriodService::new(db.clone(), clock.clone())),
            regional_migration: Arc::new(RegionalMigrationService::new(
                db,
                MigrationAuthorizer::new(),
                clock,
            )),
        }
    }
}
