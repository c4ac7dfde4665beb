//! `SocCTrader` SDK
//!
//! Public, transport-agnostic types of the `socctrader` module:
//! - record models for countries, regions, leagues, teams, games and financial actions
//! - draft types used to create and update them (no identity)
//! - [`EntityKind`] naming each record type across storage, index and REST
//! - the public error type ([`SocctraderError`])

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod errors;
pub mod models;

pub use errors::SocctraderError;
pub use models::{
    Action, Country, CountryDraft, Currency, EntityKind, FinancialAction, FinancialActionDraft,
    Game, GameDraft, League, LeagueDraft, Region, RegionDraft, Team, TeamDraft,
};
