//! `SocCTrader` records module
//!
//! CRUD and free-text search over countries, regions, leagues, teams, games
//! and financial actions. The relational store is authoritative; every
//! committed write is propagated to the search index in the background by the
//! [`SyncCoordinator`](domain::sync::SyncCoordinator).
//!
//! Wiring happens in [`module`]: [`AppServices::build`](module::AppServices::build)
//! connects the store, picks the search backend and hands back the axum router.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use socctrader_sdk::{EntityKind, SocctraderError};

pub mod module;
pub use module::AppServices;

mod api;

// Internal layers; public for integration tests and the server binary.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
#[doc(hidden)]
pub mod test_support;

/// Module name used for `modules.<name>` configuration.
pub const MODULE_NAME: &str = "socctrader";
