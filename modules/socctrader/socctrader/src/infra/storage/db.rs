use std::fmt::Display;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use socckit::config::DatabaseConfig;
use tracing::info;

use crate::domain::error::DomainError;
use crate::infra::storage::migrations::Migrator;

/// Helper to convert a database error to `DomainError`
pub fn db_err(e: impl Display) -> DomainError {
    DomainError::database(e.to_string())
}

/// Connect with the configured pool size and bring the schema up to date.
///
/// # Errors
/// Returns the driver error when the connection or a migration fails.
pub async fn connect_and_migrate(cfg: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opts = ConnectOptions::new(cfg.dsn.clone());
    opts.max_connections(cfg.max_connections.max(1))
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    // Every pooled connection to `sqlite::memory:` would get its own database.
    if cfg.dsn.starts_with("sqlite::memory:") || cfg.dsn.contains("mode=memory") {
        opts.max_connections(1).min_connections(1);
    }

    let db = Database::connect(opts).await?;
    Migrator::up(&db, None).await?;
    info!(backend = ?db.get_database_backend(), "database connected and migrated");
    Ok(db)
}
