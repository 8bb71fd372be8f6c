#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use fieldforce_core::{
    auth::{CallerIdentity, Role},
    db::{self, DbConfig, DbPool},
    entities::{edit_history, employee_profile, regional_unit, sales_record},
    services::{Clock, FixedClock},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

/// Fresh in-memory SQLite database with the embedded migrations applied.
pub async fn setup_db() -> Arc<DbPool> {
    let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Arc::new(pool)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn clock_on(year: i32, month: u32, day: u32) -> Arc<dyn Clock> {
    Arc::new(FixedClock::on(date(year, month, day)))
}

pub fn caller(role: Role) -> CallerIdentity {
    CallerIdentity::new(Uuid::new_v4(), role)
}

pub async fn seed_regional(db: &DbPool, id: &str, external_code: i32, name: &str) {
    regional_unit::ActiveModel {
        id: Set(id.to_string()),
        external_code: Set(external_code),
        name: Set(name.to_string()),
        active: Set(true),
    }
    .insert(db)
    .await
    .expect("seed regional unit");
}

pub async fn seed_sale(db: &DbPool, region_code: i32, on: NaiveDate, amount: Decimal) -> Uuid {
    let id = Uuid::new_v4();
    sales_record::ActiveModel {
        id: Set(id),
        region_code: Set(region_code),
        seller_id: Set(None),
        date: Set(on),
        amount: Set(amount),
    }
    .insert(db)
    .await
    .expect("seed sales record");
    id
}

pub async fn seed_profile(db: &DbPool, regional_id: &str) -> Uuid {
    let id = Uuid::new_v4();
    employee_profile::ActiveModel {
        id: Set(id),
        full_name: Set(format!("Seller {}", &id.to_string()[..8])),
        regional_id: Set(Some(regional_id.to_string())),
        active: Set(true),
    }
    .insert(db)
    .await
    .expect("seed employee profile");
    id
}

/// Makes every UPDATE on `table` abort, simulating a store failure.
pub async fn fail_updates_on(db: &DbPool, table: &str) {
    let sql = format!(
        "CREATE TRIGGER fail_update_{table} BEFORE UPDATE ON {table} \
         BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END;"
    );
    db.execute_unprepared(&sql)
        .await
        .expect("install failure trigger");
}

/// Makes every INSERT on `table` abort.
pub async fn fail_inserts_on(db: &DbPool, table: &str) {
    let sql = format!(
        "CREATE TRIGGER fail_insert_{table} BEFORE INSERT ON {table} \
         BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END;"
    );
    db.execute_unprepared(&sql)
        .await
        .expect("install failure trigger");
}

pub async fn all_sales(db: &DbPool) -> Vec<sales_record::Model> {
    sales_record::Entity::find()
        .order_by_asc(sales_record::Column::Id)
        .all(db)
        .await
        .expect("load sales")
}

pub async fn all_profiles(db: &DbPool) -> Vec<employee_profile::Model> {
    employee_profile::Entity::find()
        .order_by_asc(employee_profile::Column::Id)
        .all(db)
        .await
        .expect("load profiles")
}

pub async fn all_regionals(db: &DbPool) -> Vec<regional_unit::Model> {
    regional_unit::Entity::find()
        .order_by_asc(regional_unit::Column::Id)
        .all(db)
        .await
        .expect("load regional units")
}

pub async fn audit_entries(db: &DbPool) -> Vec<edit_history::Model> {
    edit_history::Entity::find()
        .all(db)
        .await
        .expect("load edit history")
}

pub async fn sale(db: &DbPool, id: Uuid) -> sales_record::Model {
    sales_record::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("load sale")
        .expect("sale exists")
}

pub async fn profile(db: &DbPool, id: Uuid) -> employee_profile::Model {
    employee_profile::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("load profile")
        .expect("profile exists")
}
