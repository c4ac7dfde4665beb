use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{League, LeagueDraft};

use super::entity::league::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for League {
    type Entity = Entity;

    fn id_column() -> Column {
        Column::Id
    }

    fn version_column() -> Column {
        Column::Version
    }

    fn sort_column(field: &str) -> Option<Column> {
        match field {
            "id" => Some(Column::Id),
            "version" => Some(Column::Version),
            "leagueId" => Some(Column::LeagueId),
            "leagueName" => Some(Column::LeagueName),
            "locationId" => Some(Column::LocationId),
            _ => None,
        }
    }

    // `league_name` is checked by `League::validate` before it gets here.
    fn new_row(draft: LeagueDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            league_id: Set(draft.league_id),
            league_name: Set(draft.league_name.unwrap_or_default()),
            location_id: Set(draft.location_id),
        }
    }

    fn field_values(draft: LeagueDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::LeagueId, draft.league_id.into()),
            (Column::LeagueName, draft.league_name.unwrap_or_default().into()),
            (Column::LocationId, draft.location_id.into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Ok(row.into())
    }
}
