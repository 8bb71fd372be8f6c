//! Regional migration against an in-memory SQLite store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{
    all_profiles, all_regionals, all_sales, audit_entries, caller, clock_on, date,
    fail_inserts_on, fail_updates_on, profile, sale, seed_profile, seed_regional, seed_sale,
    setup_db,
};
use fieldforce_core::{
    auth::{CallerIdentity, MigrationAuthorizer, Role},
    db::DbPool,
    errors::{MigrationTable, ServiceError},
    services::{
        MigrationCounts, MigrationMode, MigrationOutcome, MigrationRequest, MigrationResult,
        RegionalMigrationService,
    },
};
use rstest::rstest;
use rust_decimal_macros::dec;
use uuid::Uuid;

const NORTE: &str = "reg-norte";
const SUR: &str = "reg-sur";
const OESTE: &str = "reg-oeste";

struct Fixture {
    db: Arc<DbPool>,
    service: RegionalMigrationService,
    norte_sales: Vec<Uuid>,
    oeste_sale: Uuid,
    norte_profiles: Vec<Uuid>,
    oeste_profile: Uuid,
}

/// Three regions; NORTE (code 10) holds sales across January to March 2024.
async fn fixture() -> Fixture {
    let db = setup_db().await;
    seed_regional(&db, NORTE, 10, "Norte").await;
    seed_regional(&db, SUR, 20, "Sur").await;
    seed_regional(&db, OESTE, 30, "Oeste").await;

    let norte_sales = vec![
        seed_sale(&db, 10, date(2024, 1, 31), dec!(100.00)).await,
        seed_sale(&db, 10, date(2024, 2, 1), dec!(200.00)).await,
        seed_sale(&db, 10, date(2024, 2, 29), dec!(300.00)).await,
        seed_sale(&db, 10, date(2024, 3, 1), dec!(400.00)).await,
    ];
    let oeste_sale = seed_sale(&db, 30, date(2024, 2, 10), dec!(50.00)).await;

    let norte_profiles = vec![seed_profile(&db, NORTE).await, seed_profile(&db, NORTE).await];
    let oeste_profile = seed_profile(&db, OESTE).await;

    let service =
        RegionalMigrationService::new(db.clone(), MigrationAuthorizer::new(), clock_on(2024, 4, 2));

    Fixture {
        db,
        service,
        norte_sales,
        oeste_sale,
        norte_profiles,
        oeste_profile,
    }
}

fn norte_to_sur() -> MigrationRequest {
    MigrationRequest {
        source_regional_id: Some(NORTE.into()),
        target_regional_id: Some(SUR.into()),
        source_external_code: Some(10),
        target_external_code: Some(20),
        deactivate_source: false,
        filter_month: None,
        filter_year: None,
    }
}

fn february_2024() -> MigrationRequest {
    MigrationRequest {
        filter_month: Some(2),
        filter_year: Some(2024),
        ..norte_to_sur()
    }
}

async fn count(fx: &Fixture, request: &MigrationRequest) -> MigrationCounts {
    match fx
        .service
        .migrate(&caller(Role::Admin), request, MigrationMode::Count)
        .await
        .expect("count")
    {
        MigrationOutcome::Counted(counts) => counts,
        other => panic!("expected counts, got {:?}", other),
    }
}

async fn execute(
    fx: &Fixture,
    who: &CallerIdentity,
    request: &MigrationRequest,
) -> Result<MigrationResult, ServiceError> {
    fx.service
        .migrate(who, request, MigrationMode::Execute)
        .await
        .map(|outcome| match outcome {
            MigrationOutcome::Executed(result) => result,
            other => panic!("expected execute result, got {:?}", other),
        })
}

#[tokio::test]
async fn count_mode_reports_without_mutating() {
    let fx = fixture().await;
    let sales_before = all_sales(&fx.db).await;
    let profiles_before = all_profiles(&fx.db).await;
    let regionals_before = all_regionals(&fx.db).await;

    let mut request = norte_to_sur();
    request.deactivate_source = true;
    let counts = count(&fx, &request).await;

    assert_eq!(
        counts,
        MigrationCounts {
            sales_count: 4,
            profiles_count: 2
        }
    );
    assert_eq!(all_sales(&fx.db).await, sales_before);
    assert_eq!(all_profiles(&fx.db).await, profiles_before);
    assert_eq!(all_regionals(&fx.db).await, regionals_before);
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn scoped_count_only_limits_sales() {
    let fx = fixture().await;
    assert_eq!(
        count(&fx, &february_2024()).await,
        MigrationCounts {
            sales_count: 2,
            profiles_count: 2
        }
    );
}

#[tokio::test]
async fn execute_moves_every_matching_row_and_audits_once() {
    let fx = fixture().await;
    let admin = caller(Role::Admin);
    let expected = count(&fx, &norte_to_sur()).await;

    let result = execute(&fx, &admin, &norte_to_sur()).await.expect("execute");

    assert_eq!(
        result,
        MigrationResult {
            sales_migrated: expected.sales_count,
            profiles_migrated: expected.profiles_count,
            deactivated: false,
        }
    );
    for id in &fx.norte_sales {
        assert_eq!(sale(&fx.db, *id).await.region_code, 20);
    }
    assert_eq!(sale(&fx.db, fx.oeste_sale).await.region_code, 30);
    for id in &fx.norte_profiles {
        assert_eq!(profile(&fx.db, *id).await.regional_id.as_deref(), Some(SUR));
    }
    assert_eq!(
        profile(&fx.db, fx.oeste_profile).await.regional_id.as_deref(),
        Some(OESTE)
    );

    let entries = audit_entries(&fx.db).await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.table_name, "regionales");
    assert_eq!(entry.field_changed, "migracion_regional");
    assert_eq!(entry.record_id, NORTE);
    assert_eq!(entry.performed_by, admin.user_id);
    assert_eq!(entry.previous_value, "regional 10 (reg-norte)");
    assert_eq!(
        entry.new_value,
        "regional 20 (reg-sur); sales=4; profiles=2; scope=all"
    );

    // Source region is left active unless asked otherwise.
    let norte = all_regionals(&fx.db)
        .await
        .into_iter()
        .find(|r| r.id == NORTE)
        .unwrap();
    assert!(norte.active);
}

#[tokio::test]
async fn leap_february_scope_limits_sales_but_not_profiles() {
    let fx = fixture().await;

    let result = execute(&fx, &caller(Role::RegionalCoordinator), &february_2024())
        .await
        .expect("execute");
    assert_eq!(result.sales_migrated, 2);
    assert_eq!(result.profiles_migrated, 2);

    let codes: Vec<i32> = {
        let mut codes = Vec::new();
        for id in &fx.norte_sales {
            codes.push(sale(&fx.db, *id).await.region_code);
        }
        codes
    };
    // Jan 31, Feb 1, Feb 29, Mar 1
    assert_eq!(codes, vec![10, 20, 20, 10]);
    for id in &fx.norte_profiles {
        assert_eq!(profile(&fx.db, *id).await.regional_id.as_deref(), Some(SUR));
    }

    let entries = audit_entries(&fx.db).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].new_value.ends_with("scope=2024-02"));
}

#[rstest]
#[case(Role::Supervisor, MigrationMode::Count)]
#[case(Role::Supervisor, MigrationMode::Execute)]
#[case(Role::Seller, MigrationMode::Count)]
#[case(Role::Viewer, MigrationMode::Execute)]
#[tokio::test]
async fn disallowed_roles_are_refused(#[case] role: Role, #[case] mode: MigrationMode) {
    let fx = fixture().await;
    let sales_before = all_sales(&fx.db).await;
    let profiles_before = all_profiles(&fx.db).await;

    let result = fx.service.migrate(&caller(role), &norte_to_sur(), mode).await;

    assert_matches!(result, Err(ServiceError::Unauthorized(_)));
    assert_eq!(all_sales(&fx.db).await, sales_before);
    assert_eq!(all_profiles(&fx.db).await, profiles_before);
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn unknown_role_is_refused_before_validation() {
    let fx = fixture().await;
    let stranger = CallerIdentity::from_reported_role(Uuid::new_v4(), "superuser");

    let result = fx
        .service
        .migrate(&stranger, &MigrationRequest::default(), MigrationMode::Count)
        .await;
    assert_matches!(result, Err(ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn missing_identifiers_are_invalid() {
    let fx = fixture().await;
    let mut request = norte_to_sur();
    request.target_external_code = None;

    for mode in [MigrationMode::Count, MigrationMode::Execute] {
        let result = fx.service.migrate(&caller(Role::Admin), &request, mode).await;
        assert_matches!(result, Err(ServiceError::InvalidArgument(_)));
    }
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn sales_failure_stops_before_profiles_and_audit() {
    let fx = fixture().await;
    fail_updates_on(&fx.db, "sales_records").await;
    let profiles_before = all_profiles(&fx.db).await;

    let err = execute(&fx, &caller(Role::Admin), &norte_to_sur())
        .await
        .expect_err("sales update must fail");

    assert_matches!(
        err,
        ServiceError::MigrationFailed {
            table: MigrationTable::Sales,
            ..
        }
    );
    assert!(!err.response_message().contains("simulated"));
    assert_eq!(all_profiles(&fx.db).await, profiles_before);
    for id in &fx.norte_sales {
        assert_eq!(sale(&fx.db, *id).await.region_code, 10);
    }
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn profile_failure_leaves_sales_migrated_and_reports_profiles() {
    let fx = fixture().await;
    fail_updates_on(&fx.db, "employee_profiles").await;

    let err = execute(&fx, &caller(Role::Admin), &norte_to_sur())
        .await
        .expect_err("profile update must fail");

    assert_eq!(err.failed_table(), Some(MigrationTable::Profiles));
    // No compensation: the sales update already committed.
    for id in &fx.norte_sales {
        assert_eq!(sale(&fx.db, *id).await.region_code, 20);
    }
    for id in &fx.norte_profiles {
        assert_eq!(profile(&fx.db, *id).await.regional_id.as_deref(), Some(NORTE));
    }
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn audit_failure_is_reported_after_data_was_migrated() {
    let fx = fixture().await;
    fail_inserts_on(&fx.db, "edit_history").await;

    let err = execute(&fx, &caller(Role::Admin), &norte_to_sur())
        .await
        .expect_err("audit insert must fail");

    assert_eq!(err.failed_table(), Some(MigrationTable::AuditLog));
    assert!(err.response_message().contains("migrated but not audited"));
    for id in &fx.norte_sales {
        assert_eq!(sale(&fx.db, *id).await.region_code, 20);
    }
    for id in &fx.norte_profiles {
        assert_eq!(profile(&fx.db, *id).await.regional_id.as_deref(), Some(SUR));
    }
    assert!(audit_entries(&fx.db).await.is_empty());
}

#[tokio::test]
async fn deactivation_marks_source_inactive() {
    let fx = fixture().await;
    let mut request = norte_to_sur();
    request.deactivate_source = true;

    let result = execute(&fx, &caller(Role::Admin), &request)
        .await
        .expect("execute");
    assert!(result.deactivated);

    let regionals = all_regionals(&fx.db).await;
    let active: Vec<(&str, bool)> = regionals
        .iter()
        .map(|r| (r.id.as_str(), r.active))
        .collect();
    assert!(active.contains(&(NORTE, false)));
    assert!(active.contains(&(SUR, true)));

    let entries = audit_entries(&fx.db).await;
    assert!(entries[0].new_value.ends_with("; source deactivated"));
}

#[tokio::test]
async fn deactivation_failure_does_not_fail_the_migration() {
    let fx = fixture().await;
    fail_updates_on(&fx.db, "regionales").await;
    let mut request = norte_to_sur();
    request.deactivate_source = true;

    let result = execute(&fx, &caller(Role::Admin), &request)
        .await
        .expect("migration still succeeds");

    assert!(!result.deactivated);
    assert_eq!(result.sales_migrated, 4);
    for id in &fx.norte_sales {
        assert_eq!(sale(&fx.db, *id).await.region_code, 20);
    }
    assert_eq!(audit_entries(&fx.db).await.len(), 1);
}

#[tokio::test]
async fn deactivating_unknown_source_reports_false() {
    let fx = fixture().await;
    let request = MigrationRequest {
        source_regional_id: Some("reg-ghost".into()),
        deactivate_source: true,
        ..norte_to_sur()
    };

    let result = execute(&fx, &caller(Role::Admin), &request)
        .await
        .expect("execute");
    assert!(!result.deactivated);
    assert_eq!(result.profiles_migrated, 0);
}

#[tokio::test]
async fn plan_then_execute_commits_fresh_baseline() {
    let fx = fixture().await;
    let coordinator = caller(Role::RegionalCoordinator);

    let plan = fx
        .service
        .plan(&coordinator, &february_2024())
        .await
        .expect("plan");
    assert_eq!(
        plan.counts(),
        MigrationCounts {
            sales_count: 2,
            profiles_count: 2
        }
    );
    assert!(audit_entries(&fx.db).await.is_empty());

    // A matching row written between preview and commit is migrated too.
    let late = seed_sale(&fx.db, 10, date(2024, 2, 20), dec!(75.00)).await;

    let result = fx
        .service
        .execute_plan(&coordinator, &plan)
        .await
        .expect("execute plan");
    assert_eq!(result.sales_migrated, 3);
    assert_eq!(sale(&fx.db, late).await.region_code, 20);

    let history = fx.service.migration_history(NORTE).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].new_value.contains("sales=3"));
}

#[tokio::test]
async fn plan_cannot_be_executed_by_another_role() {
    let fx = fixture().await;
    let plan = fx
        .service
        .plan(&caller(Role::Admin), &norte_to_sur())
        .await
        .unwrap();

    let result = fx.service.execute_plan(&caller(Role::Seller), &plan).await;
    assert_matches!(result, Err(ServiceError::Unauthorized(_)));
    assert_eq!(sale(&fx.db, fx.norte_sales[0]).await.region_code, 10);
}

#[tokio::test]
async fn history_is_scoped_to_the_source_region() {
    let fx = fixture().await;
    execute(&fx, &caller(Role::Admin), &norte_to_sur())
        .await
        .unwrap();

    assert_eq!(fx.service.migration_history(NORTE).await.unwrap().len(), 1);
    assert!(fx.service.migration_history(OESTE).await.unwrap().is_empty());
}
