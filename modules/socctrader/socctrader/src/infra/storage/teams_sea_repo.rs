use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{Team, TeamDraft};

use super::entity::team::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for Team {
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
            "teamId" => Some(Column::TeamId),
            "teamName" => Some(Column::TeamName),
            "leagueId" => Some(Column::LeagueId),
            "gameId" => Some(Column::GameId),
            _ => None,
        }
    }

    fn new_row(draft: TeamDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            team_id: Set(draft.team_id),
            team_name: Set(draft.team_name),
            league_id: Set(draft.league_id),
            game_id: Set(draft.game_id),
        }
    }

    fn field_values(draft: TeamDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::TeamId, draft.team_id.into()),
            (Column::TeamName, draft.team_name.into()),
            (Column::LeagueId, draft.league_id.into()),
            (Column::GameId, draft.game_id.into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Ok(row.into())
    }
}
