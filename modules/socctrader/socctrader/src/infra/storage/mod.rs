//! Relational persistence on `SeaORM`.
//!
//! - `entity/`: one table per record type, all with `id` and `version` columns
//! - `mapper.rs`: table rows to SDK records and drafts to column values
//! - `sea_repo.rs`: the generic [`SeaRecordRepository`]
//! - `*_sea_repo.rs`: per-record column bindings and sort whitelists
//! - `migrations/`: schema

pub mod db;
pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod sea_repo;

mod countries_sea_repo;
mod financial_actions_sea_repo;
mod games_sea_repo;
mod leagues_sea_repo;
mod regions_sea_repo;
mod teams_sea_repo;

pub use db::{connect_and_migrate, db_err};
pub use sea_repo::{SeaBinding, SeaRecordRepository};
