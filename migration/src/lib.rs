pub use sea_orm_migration::prelude::*;

mod util;
mod m20241020_000001_create_payroll_tables;
mod m20241021_000001_create_scheduler_state;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241020_000001_create_payroll_tables::Migration),
            Box::new(m20241021_000001_create_scheduler_state::Migration),
        ]
    }
}
