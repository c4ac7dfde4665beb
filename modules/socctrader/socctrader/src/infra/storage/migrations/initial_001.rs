use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

/// All six record tables. Identities come from `BIGSERIAL` / `AUTOINCREMENT`
/// so a deleted id is never handed out again.
#[derive(DeriveMigrationName)]
pub struct Migration;

const TABLES: &[&str] = &[
    "country",
    "region",
    "league",
    "team",
    "game",
    "financial_action",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        let sql = match backend {
            sea_orm::DatabaseBackend::Postgres => {
                r"
CREATE TABLE IF NOT EXISTS country (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    country_id BIGINT,
    country_name VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS region (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    region_id BIGINT,
    region_name VARCHAR(255)
);

CREATE TABLE IF NOT EXISTS league (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    league_id BIGINT,
    league_name VARCHAR(255) NOT NULL,
    location_id BIGINT
);

CREATE TABLE IF NOT EXISTS team (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    team_id BIGINT,
    team_name VARCHAR(255),
    league_id BIGINT,
    game_id BIGINT
);

CREATE TABLE IF NOT EXISTS game (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    host_id BIGINT,
    visitor_id BIGINT
);

CREATE TABLE IF NOT EXISTS financial_action (
    id BIGSERIAL PRIMARY KEY,
    version BIGINT NOT NULL DEFAULT 1,
    action_id BIGINT,
    action VARCHAR(16),
    amount VARCHAR(64),
    currency VARCHAR(8),
    user_id BIGINT
);

CREATE INDEX IF NOT EXISTS idx_team_league_id ON team(league_id);
CREATE INDEX IF NOT EXISTS idx_financial_action_user_id ON financial_action(user_id);
                "
            }
            sea_orm::DatabaseBackend::Sqlite => {
                r"
CREATE TABLE IF NOT EXISTS country (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    country_id INTEGER,
    country_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS region (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    region_id INTEGER,
    region_name TEXT
);

CREATE TABLE IF NOT EXISTS league (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    league_id INTEGER,
    league_name TEXT NOT NULL,
    location_id INTEGER
);

CREATE TABLE IF NOT EXISTS team (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    team_id INTEGER,
    team_name TEXT,
    league_id INTEGER,
    game_id INTEGER
);

CREATE TABLE IF NOT EXISTS game (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    host_id INTEGER,
    visitor_id INTEGER
);

CREATE TABLE IF NOT EXISTS financial_action (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 1,
    action_id INTEGER,
    action TEXT,
    amount TEXT,
    currency TEXT,
    user_id INTEGER
);

CREATE INDEX IF NOT EXISTS idx_team_league_id ON team(league_id);
CREATE INDEX IF NOT EXISTS idx_financial_action_user_id ON financial_action(user_id);
                "
            }
            sea_orm::DatabaseBackend::MySql => {
                return Err(DbErr::Migration(
                    "MySQL is not a supported backend".to_owned(),
                ));
            }
        };

        conn.execute_unprepared(sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for table in TABLES.iter().rev() {
            conn.execute_unprepared(&format!("DROP TABLE IF EXISTS {table};"))
                .await?;
        }
        Ok(())
    }
}
