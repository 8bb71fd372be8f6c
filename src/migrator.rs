use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_periods_table::Migration),
            Box::new(m20250101_000002_create_regional_tables::Migration),
            Box::new(m20250101_000003_create_edit_history_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_periods_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_periods_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Periods::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Periods::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Periods::Month).integer().not_null())
                        .col(ColumnDef::new(Periods::Year).integer().not_null())
                        .col(
                            ColumnDef::new(Periods::State)
                                .string_len(16)
                                .not_null()
                                .default("open"),
                        )
                        .col(ColumnDef::new(Periods::ClosedAt).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Periods::ClosedBy).uuid().null())
                        .col(
                            ColumnDef::new(Periods::TotalRecords)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Periods::TotalAmount)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Periods::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Periods::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Concurrent get-or-create callers converge on the first committed row.
            manager
                .create_index(
                    Index::create()
                        .name("ux_periods_month_year")
                        .table(Periods::Table)
                        .col(Periods::Month)
                        .col(Periods::Year)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Periods::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Periods {
        Table,
        Id,
        Month,
        Year,
        State,
        ClosedAt,
        ClosedBy,
        TotalRecords,
        TotalAmount,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_regional_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_regional_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Regionales::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Regionales::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Regionales::ExternalCode)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Regionales::Name).string().not_null())
                        .col(
                            ColumnDef::new(Regionales::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesRecords::RegionCode).integer().not_null())
                        .col(ColumnDef::new(SalesRecords::SellerId).uuid().null())
                        .col(ColumnDef::new(SalesRecords::Date).date().not_null())
                        .col(
                            ColumnDef::new(SalesRecords::Amount)
                                .decimal_len(16, 2)
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sales_records_region_date")
                        .table(SalesRecords::Table)
                        .col(SalesRecords::RegionCode)
                        .col(SalesRecords::Date)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EmployeeProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EmployeeProfiles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EmployeeProfiles::FullName).string().not_null())
                        .col(ColumnDef::new(EmployeeProfiles::RegionalId).string().null())
                        .col(
                            ColumnDef::new(EmployeeProfiles::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_employee_profiles_regional_id")
                        .table(EmployeeProfiles::Table)
                        .col(EmployeeProfiles::RegionalId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EmployeeProfiles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesRecords::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Regionales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Regionales {
        Table,
        Id,
        ExternalCode,
        Name,
        Active,
    }

    #[derive(Iden)]
    enum SalesRecords {
        Table,
        Id,
        RegionCode,
        SellerId,
        Date,
        Amount,
    }

    #[derive(Iden)]
    enum EmployeeProfiles {
        Table,
        Id,
        FullName,
        RegionalId,
        Active,
    }
}

mod m20250101_000003_create_edit_history_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_edit_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(EditHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EditHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EditHistory::TableName).string().not_null())
                        .col(ColumnDef::new(EditHistory::RecordId).string().not_null())
                        .col(ColumnDef::new(EditHistory::FieldChanged).string().not_null())
                        .col(ColumnDef::new(EditHistory::PreviousValue).text().not_null())
                        .col(ColumnDef::new(EditHistory::NewValue).text().not_null())
                        .col(ColumnDef::new(EditHistory::PerformedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(EditHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_edit_history_table_record")
                        .table(EditHistory::Table)
                        .col(EditHistory::TableName)
                        .col(EditHistory::RecordId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EditHistory::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum EditHistory {
        Table,
        Id,
        TableName,
        RecordId,
        FieldChanged,
        PreviousValue,
        NewValue,
        PerformedBy,
        CreatedAt,
    }
}
