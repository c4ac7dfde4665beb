use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{Game, GameDraft};

use super::entity::game::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for Game {
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
            "hostId" => Some(Column::HostId),
            "visitorId" => Some(Column::VisitorId),
            _ => None,
        }
    }

    fn new_row(draft: GameDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            host_id: Set(draft.host_id),
            visitor_id: Set(draft.visitor_id),
        }
    }

    fn field_values(draft: GameDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::HostId, draft.host_id.into()),
            (Column::VisitorId, draft.visitor_id.into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Ok(row.into())
    }
}
