use std::str::FromStr;

use rust_decimal::Decimal;
use socctrader_sdk::{Country, FinancialAction, Game, League, Region, Team};

use super::entity::{country, financial_action, game, league, region, team};
use crate::domain::error::DomainError;

impl From<country::Model> for Country {
    fn from(row: country::Model) -> Self {
        Self {
            id: row.id,
            version: row.version,
            country_id: row.country_id,
            country_name: row.country_name,
        }
    }
}

impl From<region::Model> for Region {
    fn from(row: region::Model) -> Self {
        Self {
            id: row.id,
            version: row.version,
            region_id: row.region_id,
            region_name: row.region_name,
        }
    }
}

impl From<league::Model> for League {
    fn from(row: league::Model) -> Self {
        Self {
            id: row.id,
            version: row.version,
            league_id: row.league_id,
            league_name: row.league_name,
            location_id: row.location_id,
        }
    }
}

impl From<team::Model> for Team {
    fn from(row: team::Model) -> Self {
        Self {
            id: row.id,
            version: row.version,
            team_id: row.team_id,
            team_name: row.team_name,
            league_id: row.league_id,
            game_id: row.game_id,
        }
    }
}

impl From<game::Model> for Game {
    fn from(row: game::Model) -> Self {
        Self {
            id: row.id,
            version: row.version,
            host_id: row.host_id,
            visitor_id: row.visitor_id,
        }
    }
}

fn parse_column<T>(column: &str, value: Option<String>) -> Result<Option<T>, DomainError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                DomainError::database(format!("financial_action.{column} holds '{raw}': {e}"))
            })
        })
        .transpose()
}

impl TryFrom<financial_action::Model> for FinancialAction {
    type Error = DomainError;

    fn try_from(row: financial_action::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            version: row.version,
            action_id: row.action_id,
            action: parse_column("action", row.action)?,
            amount: parse_column::<Decimal>("amount", row.amount)?,
            currency: parse_column("currency", row.currency)?,
            user_id: row.user_id,
        })
    }
}
