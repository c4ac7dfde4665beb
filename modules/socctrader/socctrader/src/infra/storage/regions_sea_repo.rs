use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{Region, RegionDraft};

use super::entity::region::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for Region {
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
            "regionId" => Some(Column::RegionId),
            "regionName" => Some(Column::RegionName),
            _ => None,
        }
    }

    fn new_row(draft: RegionDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            region_id: Set(draft.region_id),
            region_name: Set(draft.region_name),
        }
    }

    fn field_values(draft: RegionDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::RegionId, draft.region_id.into()),
            (Column::RegionName, draft.region_name.into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Ok(row.into())
    }
}
