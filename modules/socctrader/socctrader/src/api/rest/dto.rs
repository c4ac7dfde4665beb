//! REST representations. `id` is optional on the way in: POST must omit it
//! and PUT without it behaves as POST. The row version stays internal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use socctrader_sdk::{
    Action, Country, CountryDraft, Currency, FinancialAction, FinancialActionDraft, Game,
    GameDraft, League, LeagueDraft, Region, RegionDraft, Team, TeamDraft,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub country_id: Option<i64>,
    #[serde(default)]
    pub country_name: Option<String>,
}

impl From<Country> for CountryDto {
    fn from(c: Country) -> Self {
        Self {
            id: Some(c.id),
            country_id: c.country_id,
            country_name: Some(c.country_name),
        }
    }
}

impl From<CountryDto> for CountryDraft {
    fn from(dto: CountryDto) -> Self {
        Self {
            country_id: dto.country_id,
            country_name: dto.country_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default)]
    pub region_name: Option<String>,
}

impl From<Region> for RegionDto {
    fn from(r: Region) -> Self {
        Self {
            id: Some(r.id),
            region_id: r.region_id,
            region_name: r.region_name,
        }
    }
}

impl From<RegionDto> for RegionDraft {
    fn from(dto: RegionDto) -> Self {
        Self {
            region_id: dto.region_id,
            region_name: dto.region_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub league_id: Option<i64>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub location_id: Option<i64>,
}

impl From<League> for LeagueDto {
    fn from(l: League) -> Self {
        Self {
            id: Some(l.id),
            league_id: l.league_id,
            league_name: Some(l.league_name),
            location_id: l.location_id,
        }
    }
}

impl From<LeagueDto> for LeagueDraft {
    fn from(dto: LeagueDto) -> Self {
        Self {
            league_id: dto.league_id,
            league_name: dto.league_name,
            location_id: dto.location_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub league_id: Option<i64>,
    #[serde(default)]
    pub game_id: Option<i64>,
}

impl From<Team> for TeamDto {
    fn from(t: Team) -> Self {
        Self {
            id: Some(t.id),
            team_id: t.team_id,
            team_name: t.team_name,
            league_id: t.league_id,
            game_id: t.game_id,
        }
    }
}

impl From<TeamDto> for TeamDraft {
    fn from(dto: TeamDto) -> Self {
        Self {
            team_id: dto.team_id,
            team_name: dto.team_name,
            league_id: dto.league_id,
            game_id: dto.game_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub host_id: Option<i64>,
    #[serde(default)]
    pub visitor_id: Option<i64>,
}

impl From<Game> for GameDto {
    fn from(g: Game) -> Self {
        Self {
            id: Some(g.id),
            host_id: g.host_id,
            visitor_id: g.visitor_id,
        }
    }
}

impl From<GameDto> for GameDraft {
    fn from(dto: GameDto) -> Self {
        Self {
            host_id: dto.host_id,
            visitor_id: dto.visitor_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialActionDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub action_id: Option<i64>,
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl From<FinancialAction> for FinancialActionDto {
    fn from(f: FinancialAction) -> Self {
        Self {
            id: Some(f.id),
            action_id: f.action_id,
            action: f.action,
            amount: f.amount,
            currency: f.currency,
            user_id: f.user_id,
        }
    }
}

impl From<FinancialActionDto> for FinancialActionDraft {
    fn from(dto: FinancialActionDto) -> Self {
        Self {
            action_id: dto.action_id,
            action: dto.action,
            amount: dto.amount,
            currency: dto.currency,
            user_id: dto.user_id,
        }
    }
}
