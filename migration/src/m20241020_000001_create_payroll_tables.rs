use sea_orm_migration::prelude::*;

use crate::util::{default_table_statement, DefaultColumn};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(default_table_statement()
                .table(Worker::Table)
                .col(ColumnDef::new(Worker::FirstName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Worker::LastName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Worker::BaseSalary)
                    .big_integer()
                    .not_null()) // Minor currency units
                .col(ColumnDef::new(Worker::Role)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Worker::ActiveSince)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Worker::RetiredAt)
                    .date()
                    .null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Incidence::Table)
                .col(ColumnDef::new(Incidence::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Incidence::Amount)
                    .big_integer()
                    .not_null()) // Always positive, `is_deduction` carries the sign
                .col(ColumnDef::new(Incidence::IsDeduction)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(Incidence::Reason)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Incidence::WorkerId)
                    .uuid()
                    .null())
                .foreign_key(ForeignKey::create()
                    .name("fk_incidence_worker")
                    .from(Incidence::Table, Incidence::WorkerId)
                    .to(Worker::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .on_update(ForeignKeyAction::Cascade))
                .take()
            ).await?;

        manager
            .create_index(Index::create()
                .if_not_exists()
                .name("idx_incidence_worker_date")
                .table(Incidence::Table)
                .col(Incidence::WorkerId)
                .col(Incidence::Date)
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(PayrollRun::Table)
                .col(ColumnDef::new(PayrollRun::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(PayrollRun::TotalAmount)
                    .big_integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(PayrollRun::Status)
                    .string_len(16)
                    .not_null()
                    .default("UNPAID"))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(PayrollEntry::Table)
                .col(ColumnDef::new(PayrollEntry::BaseSalary)
                    .big_integer()
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::IncidenceTotal)
                    .big_integer()
                    .null())
                .col(ColumnDef::new(PayrollEntry::Total)
                    .big_integer()
                    .null())
                .col(ColumnDef::new(PayrollEntry::Details)
                    .text()
                    .null())
                .col(ColumnDef::new(PayrollEntry::WorkerId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(PayrollEntry::PayrollRunId)
                    .uuid()
                    .not_null())
                .foreign_key(ForeignKey::create()
                    .name("fk_payroll_entry_worker")
                    .from(PayrollEntry::Table, PayrollEntry::WorkerId)
                    .to(Worker::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::Cascade))
                .foreign_key(ForeignKey::create()
                    .name("fk_payroll_entry_run")
                    .from(PayrollEntry::Table, PayrollEntry::PayrollRunId)
                    .to(PayrollRun::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::Cascade))
                .take()
            ).await?;

        // One entry per worker per run
        manager
            .create_index(Index::create()
                .if_not_exists()
                .name("idx_payroll_entry_worker_run")
                .table(PayrollEntry::Table)
                .col(PayrollEntry::WorkerId)
                .col(PayrollEntry::PayrollRunId)
                .unique()
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(TableDropStatement::new()
                .table(PayrollEntry::Table)
                .take()
            ).await?;

        manager
            .drop_table(TableDropStatement::new()
                .table(PayrollRun::Table)
                .take()
            ).await?;

        manager
            .drop_table(TableDropStatement::new()
                .table(Incidence::Table)
                .take()
            ).await?;

        manager
            .drop_table(TableDropStatement::new()
                .table(Worker::Table)
                .take()
            ).await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Worker {
    Table,
    FirstName,
    LastName,
    BaseSalary,
    Role,
    ActiveSince,
    RetiredAt,
}

#[derive(DeriveIden)]
enum Incidence {
    Table,
    Date,
    Amount,
    IsDeduction,
    Reason,
    WorkerId,
}

#[derive(DeriveIden)]
enum PayrollRun {
    Table,
    Date,
    TotalAmount,
    Status,
}

#[derive(DeriveIden)]
enum PayrollEntry {
    Table,
    BaseSalary,
    IncidenceTotal,
    Total,
    Details,
    WorkerId,
    PayrollRunId,
}
