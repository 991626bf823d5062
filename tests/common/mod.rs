#![allow(dead_code)]

use deals_ledger::config::CoreSettings;
use deals_ledger::entities::deals;
use deals_ledger::services::deals::{create_deal, NewDeal};
use deals_ledger::AppState;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::env;
use tokio::sync::OnceCell;

static SHARED_DB_MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Set up a migrated test database
///
/// Uses TEST_DATABASE_URL when set (Postgres, with a pool wide enough for the
/// concurrency tests to contend on row locks), otherwise a private in-memory
/// SQLite database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let (database_url, shared) = match env::var("TEST_DATABASE_URL") {
        Ok(url) => (url, true),
        Err(_) => ("sqlite::memory:".to_string(), false),
    };
    // An in-memory database lives and dies with its connection
    let pool_size = if shared { 16 } else { 1 };

    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(pool_size)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    if shared {
        // Tests run in parallel against one database; migrate it once
        SHARED_DB_MIGRATED
            .get_or_try_init(|| migration::Migrator::up(&db, None))
            .await?;
    } else {
        migration::Migrator::up(&db, None).await?;
    }
    Ok(db)
}

pub async fn setup_test_state() -> AppState {
    setup_test_state_with(CoreSettings::default()).await
}

pub async fn setup_test_state_with(settings: CoreSettings) -> AppState {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    AppState::new(db, settings)
}

pub async fn seed_deal(db: &DatabaseConnection, price: Decimal) -> deals::Model {
    create_deal(
        db,
        NewDeal {
            title: "Noise cancelling headphones".to_string(),
            url: "https://shop.example/headphones".to_string(),
            price,
            original_price: None,
            currency: "usd".to_string(),
            source: "amazon".to_string(),
        },
    )
    .await
    .expect("Failed to seed deal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        assert!(db.is_ok(), "Test database setup should succeed");
    }
}
