use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use fieldforce_core::{
    auth::CallerIdentity,
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::{edit_history, Period},
    errors::ServiceError,
    services::{MigrationMode, MigrationOutcome, MigrationRequest, SystemClock, TargetPeriod},
    AppServices,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Db(command) => handle_db_command(&context, command).await?,
        Commands::Period(command) => handle_period_command(&context, command, cli.json).await?,
        Commands::Regional(command) => {
            handle_regional_command(&context, command, cli.json).await?
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "fieldforce-admin",
    about = "Operator CLI for sales periods and regional migrations",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Db(DbCommands),
    #[command(subcommand)]
    Period(PeriodCommands),
    #[command(subcommand)]
    Regional(RegionalCommands),
}

#[derive(Subcommand)]
enum DbCommands {
    /// Apply pending embedded migrations
    Migrate,
}

#[derive(Subcommand)]
enum PeriodCommands {
    /// Resolve the period new data should be written to
    Current(PeriodCurrentArgs),
    Status(PeriodKeyArgs),
    List(PeriodListArgs),
    Close(PeriodCloseArgs),
}

#[derive(Args)]
struct PeriodCurrentArgs {
    #[arg(long, value_parser = parse_date, help = "Resolve for this date (YYYY-MM-DD) instead of today")]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct PeriodKeyArgs {
    #[arg(long, help = "Calendar month (1-12)")]
    month: u32,
    #[arg(long, help = "Calendar year")]
    year: i32,
}

#[derive(Args)]
struct PeriodListArgs {
    #[arg(long, default_value_t = 12, value_parser = parse_positive_u64, help = "Maximum periods to show")]
    limit: u64,
}

#[derive(Args)]
struct PeriodCloseArgs {
    #[command(flatten)]
    period: PeriodKeyArgs,
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "User closing the period")]
    closed_by: Uuid,
    #[arg(long, requires = "amount", help = "Frozen record count; computed from sales when omitted")]
    records: Option<i64>,
    #[arg(long, requires = "records", value_parser = parse_decimal, help = "Frozen amount; computed from sales when omitted")]
    amount: Option<Decimal>,
}

#[derive(Subcommand)]
enum RegionalCommands {
    /// Preview (default) or execute a regional migration
    Migrate(RegionalMigrateArgs),
    History(RegionalHistoryArgs),
}

#[derive(Args)]
struct RegionalMigrateArgs {
    #[arg(long, help = "Regional unit id data moves out of")]
    source_id: String,
    #[arg(long, help = "Regional unit id data moves into")]
    target_id: String,
    #[arg(long, help = "External code stamped on the source region's sales")]
    source_code: i32,
    #[arg(long, help = "External code to stamp on migrated sales")]
    target_code: i32,
    #[arg(long, requires = "year", help = "Only migrate sales dated in this month")]
    month: Option<u32>,
    #[arg(long, requires = "month", help = "Year of the month filter")]
    year: Option<i32>,
    #[arg(long, action = ArgAction::SetTrue, help = "Mark the source unit inactive afterwards")]
    deactivate_source: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Apply the migration instead of counting")]
    execute: bool,
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "User performing the migration")]
    caller: Uuid,
    #[arg(long, help = "Role of the caller, e.g. admin or regional_coordinator")]
    role: String,
}

#[derive(Args)]
struct RegionalHistoryArgs {
    #[arg(long, help = "Source regional unit id")]
    source_id: String,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    services: AppServices,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .map_err(operator_error("failed to connect to database"))?;
        let db = Arc::new(db_pool);

        let clock = Arc::new(SystemClock::new(config.utc_offset()));
        let services = AppServices::new(db.clone(), clock);

        Ok(Self {
            config,
            db,
            services,
        })
    }
}

async fn handle_db_command(context: &CliContext, command: DbCommands) -> Result<()> {
    match command {
        DbCommands::Migrate => {
            if context.config.auto_migrate {
                println!("Migrations already applied on startup");
                return Ok(());
            }
            db::run_migrations(&context.db)
                .await
                .map_err(operator_error("failed to run migrations"))?;
            println!("Migrations applied");
            Ok(())
        }
    }
}

async fn handle_period_command(
    context: &CliContext,
    command: PeriodCommands,
    json: bool,
) -> Result<()> {
    let service = &context.services.periods;
    match command {
        PeriodCommands::Current(args) => {
            let target = match args.date {
                Some(date) => service.resolve_current_target_period(date).await,
                None => service.current_target_period().await,
            }
            .map_err(operator_error("failed to resolve target period"))?;
            if json {
                print_json(&target)?;
            } else {
                render_target(&target);
            }
        }
        PeriodCommands::Status(args) => {
            let period = service
                .get_period(args.month, args.year)
                .await
                .map_err(operator_error(format!(
                    "failed to load period {:02}/{}",
                    args.month, args.year
                )))?;
            match (period, json) {
                (Some(period), true) => print_json(&period)?,
                (Some(period), false) => render_period(&period),
                (None, true) => print_json(&serde_json::Value::Null)?,
                (None, false) => println!(
                    "Period {}-{:02} has not been opened (accepting writes)",
                    args.year, args.month
                ),
            }
        }
        PeriodCommands::List(args) => {
            let periods = service
                .list_periods(args.limit)
                .await
                .map_err(operator_error("failed to list periods"))?;
            if json {
                print_json(&periods)?;
            } else if periods.is_empty() {
                println!("No periods recorded");
            } else {
                periods.iter().for_each(render_period);
            }
        }
        PeriodCommands::Close(args) => {
            let PeriodKeyArgs { month, year } = args.period;
            let closed = match (args.records, args.amount) {
                (Some(records), Some(amount)) => {
                    service
                        .close_period(month, year, args.closed_by, records, amount)
                        .await
                }
                _ => {
                    service
                        .close_period_with_computed_totals(month, year, args.closed_by)
                        .await
                }
            }
            .map_err(operator_error(format!(
                "failed to close period {:02}/{}",
                month, year
            )))?;
            if json {
                print_json(&closed)?;
            } else {
                render_period(&closed);
            }
        }
    }
    Ok(())
}

async fn handle_regional_command(
    context: &CliContext,
    command: RegionalCommands,
    json: bool,
) -> Result<()> {
    let service = &context.services.regional_migration;
    match command {
        RegionalCommands::Migrate(args) => {
            let caller = CallerIdentity::from_reported_role(args.caller, &args.role);
            let mode = if args.execute {
                MigrationMode::Execute
            } else {
                MigrationMode::Count
            };
            let request = MigrationRequest {
                source_regional_id: Some(args.source_id),
                target_regional_id: Some(args.target_id),
                source_external_code: Some(args.source_code),
                target_external_code: Some(args.target_code),
                deactivate_source: args.deactivate_source,
                filter_month: args.month,
                filter_year: args.year,
            };

            let outcome = service
                .migrate(&caller, &request, mode)
                .await
                .map_err(operator_error("regional migration failed"))?;
            if json {
                print_json(&outcome)?;
                return Ok(());
            }
            match outcome {
                MigrationOutcome::Counted(counts) => println!(
                    "Would migrate {} sales records and {} employee profiles (re-run with --execute to apply)",
                    counts.sales_count, counts.profiles_count
                ),
                MigrationOutcome::Executed(result) => {
                    println!(
                        "Migrated {} sales records and {} employee profiles",
                        result.sales_migrated, result.profiles_migrated
                    );
                    if request.deactivate_source && !result.deactivated {
                        println!("Warning: source regional unit was not deactivated");
                    }
                }
            }
        }
        RegionalCommands::History(args) => {
            let entries = service
                .migration_history(&args.source_id)
                .await
                .map_err(operator_error(format!(
                    "failed to load history for {}",
                    args.source_id
                )))?;
            if json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("No migrations recorded for {}", args.source_id);
            } else {
                entries.iter().for_each(render_history_entry);
            }
        }
    }
    Ok(())
}

/// Maps a service error to an operator message; storage details only reach the log.
fn operator_error(action: impl Into<String>) -> impl FnOnce(ServiceError) -> anyhow::Error {
    let action = action.into();
    move |err| {
        error!(error = ?err, "{}", action);
        anyhow!("{}: {}", action, err.response_message())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_target(target: &TargetPeriod) {
    if target.is_closing_day {
        println!(
            "Target period {}-{:02} (closing day: previous month still open)",
            target.year, target.month
        );
    } else {
        println!("Target period {}-{:02}", target.year, target.month);
    }
}

fn render_period(period: &Period) {
    let closed = period
        .closed_at
        .map(|at| format!(" • closed {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    println!(
        "- {}-{:02} • {:?} • {} records • {}{}",
        period.year, period.month, period.state, period.total_records, period.total_amount, closed
    );
}

fn render_history_entry(entry: &edit_history::Model) {
    println!(
        "- {} • by {} • {} -> {}",
        entry.created_at.format("%Y-%m-%d %H:%M"),
        entry.performed_by,
        entry.previous_value,
        entry.new_value
    );
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("invalid date '{raw}'"))
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_positive_u64(raw: &str) -> Result<u64, String> {
    let value: u64 = raw
        .parse()
        .map_err(|_| format!("invalid integer '{raw}'"))?;
    if value == 0 {
        Err("value must be greater than zero".to_string())
    } else {
        Ok(value)
    }
}
