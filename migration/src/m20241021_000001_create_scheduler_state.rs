use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(TableCreateStatement::new()
                .if_not_exists()
                .table(SchedulerState::Table)
                .col(ColumnDef::new(SchedulerState::Key)
                    .string_len(64)
                    .not_null()
                    .primary_key())
                .col(ColumnDef::new(SchedulerState::LastFiredOn)
                    .date()
                    .not_null())
                .col(ColumnDef::new(SchedulerState::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()))
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(TableDropStatement::new()
                .table(SchedulerState::Table)
                .take()
            ).await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum SchedulerState {
    Table,
    Key,
    LastFiredOn,
    UpdatedAt,
}
