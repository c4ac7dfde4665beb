use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{Country, CountryDraft};

use super::entity::country::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for Country {
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
            "countryId" => Some(Column::CountryId),
            "countryName" => Some(Column::CountryName),
            _ => None,
        }
    }

    fn new_row(draft: CountryDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            country_id: Set(draft.country_id),
            country_name: Set(draft.country_name.unwrap_or_default()),
        }
    }

    fn field_values(draft: CountryDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::CountryId, draft.country_id.into()),
            (Column::CountryName, draft.country_name.unwrap_or_default().into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Ok(row.into())
    }
}
