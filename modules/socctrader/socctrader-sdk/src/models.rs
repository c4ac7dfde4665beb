//! Public models for the `socctrader` module.
//!
//! Records are what the store returns: a store-assigned `id`, the row
//! `version` (1 on create, bumped on every update) and the business fields.
//! Drafts carry only the business fields and are what callers submit.
//!
//! Records serialize in camelCase; that JSON is also the search document body.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The record types managed by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Country,
    Region,
    League,
    Team,
    Game,
    FinancialAction,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Country,
        Self::Region,
        Self::League,
        Self::Team,
        Self::Game,
        Self::FinancialAction,
    ];

    /// Name used in alert headers and error parameters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::League => "league",
            Self::Team => "team",
            Self::Game => "game",
            Self::FinancialAction => "financialAction",
        }
    }

    /// REST collection segment (`/api/{collection}`).
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::Region => "regions",
            Self::League => "leagues",
            Self::Team => "teams",
            Self::Game => "games",
            Self::FinancialAction => "financial-actions",
        }
    }

    /// Search index name, before any configured prefix.
    #[must_use]
    pub const fn index_name(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::League => "league",
            Self::Team => "team",
            Self::Game => "game",
            Self::FinancialAction => "financialaction",
        }
    }

    #[must_use]
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == collection)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Deposit,
    Withdraw,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
        }
    }
}

impl FromStr for Action {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            other => Err(UnknownVariant {
                what: "action",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EUR" => Ok(Self::Eur),
            "USD" => Ok(Self::Usd),
            "GBP" => Ok(Self::Gbp),
            other => Err(UnknownVariant {
                what: "currency",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub version: i64,
    pub country_id: Option<i64>,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountryDraft {
    pub country_id: Option<i64>,
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub version: i64,
    pub region_id: Option<i64>,
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionDraft {
    pub region_id: Option<i64>,
    pub region_name: Option<String>,
}

/// A league; `location_id` refers to a location owned by another service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: i64,
    pub version: i64,
    pub league_id: Option<i64>,
    pub league_name: String,
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeagueDraft {
    pub league_id: Option<i64>,
    pub league_name: Option<String>,
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub version: i64,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub league_id: Option<i64>,
    pub game_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamDraft {
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub league_id: Option<i64>,
    pub game_id: Option<i64>,
}

/// A game between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub version: i64,
    pub host_id: Option<i64>,
    pub visitor_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameDraft {
    pub host_id: Option<i64>,
    pub visitor_id: Option<i64>,
}

/// A deposit or withdrawal record. No accounting is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAction {
    pub id: i64,
    pub version: i64,
    pub action_id: Option<i64>,
    pub action: Option<Action>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FinancialActionDraft {
    pub action_id: Option<i64>,
    pub action: Option<Action>,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub user_id: Option<i64>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn kinds_resolve_from_their_collection() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_collection(kind.collection()), Some(kind));
        }
        assert_eq!(EntityKind::from_collection("users"), None);
    }

    #[test]
    fn financial_action_kind_names() {
        let kind = EntityKind::FinancialAction;
        assert_eq!(kind.name(), "financialAction");
        assert_eq!(kind.collection(), "financial-actions");
        assert_eq!(kind.index_name(), "financialaction");
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::json!("financialAction")
        );
    }

    #[test]
    fn enums_use_upper_case_wire_names() {
        assert_eq!(
            serde_json::to_value(Action::Withdraw).unwrap(),
            serde_json::json!("WITHDRAW")
        );
        assert_eq!(
            serde_json::to_value(Currency::Gbp).unwrap(),
            serde_json::json!("GBP")
        );
        assert_eq!("USD".parse::<Currency>(), Ok(Currency::Usd));
        assert!("BTC".parse::<Currency>().is_err());
        assert_eq!(Action::Deposit.as_str().parse::<Action>(), Ok(Action::Deposit));
    }

    #[test]
    fn team_serializes_in_camel_case() {
        let team = Team {
            id: 3,
            version: 1,
            team_id: Some(1),
            team_name: Some("AAAAA".to_owned()),
            league_id: None,
            game_id: None,
        };
        let v = serde_json::to_value(&team).unwrap();
        assert_eq!(v["teamName"], "AAAAA");
        assert_eq!(v["teamId"], 1);
        assert!(v["leagueId"].is_null());
    }
}
