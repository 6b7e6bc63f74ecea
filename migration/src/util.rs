use sea_orm_migration::prelude::*;

/// Every payroll table starts with a UUID primary key and a creation timestamp.
///
/// Ids are generated by the application, so the statement carries no
/// backend specific default for them.
pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .not_null()
            .primary_key()
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
}
