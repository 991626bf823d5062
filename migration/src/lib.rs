pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_deals;
mod m20261001_000002_create_price_histories;
mod m20261001_000003_create_price_trackers;
mod m20261002_000001_create_token_balances;
mod m20261002_000002_create_token_transactions;

/// Fractional digits of every money column
pub const MONEY_SCALE: u32 = 8;

/// Total digits of money columns. Postgres gets `numeric(20, 8)`; SQLite's
/// DDL builder refuses precisions above 16.
pub fn money_precision(manager: &SchemaManager) -> u32 {
    match manager.get_database_backend() {
        sea_orm_migration::sea_orm::DatabaseBackend::Sqlite => 16,
        _ => 20,
    }
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_deals::Migration),
            Box::new(m20261001_000002_create_price_histories::Migration),
            Box::new(m20261001_000003_create_price_trackers::Migration),
            Box::new(m20261002_000001_create_token_balances::Migration),
            Box::new(m20261002_000002_create_token_transactions::Migration),
        ]
    }
}
