use sea_orm::{NotSet, Set, Value};
use socctrader_sdk::{FinancialAction, FinancialActionDraft};

use super::entity::financial_action::{ActiveModel, Column, Entity, Model};
use super::sea_repo::SeaBinding;
use crate::domain::error::DomainError;

impl SeaBinding for FinancialAction {
    type Entity = Entity;

    fn id_column() -> Column {
        Column::Id
    }

    fn version_column() -> Column {
        Column::Version
    }

    // `amount` is stored as text, so it is not offered as a sort key.
    fn sort_column(field: &str) -> Option<Column> {
        match field {
            "id" => Some(Column::Id),
            "version" => Some(Column::Version),
            "actionId" => Some(Column::ActionId),
            "action" => Some(Column::Action),
            "currency" => Some(Column::Currency),
            "userId" => Some(Column::UserId),
            _ => None,
        }
    }

    fn new_row(draft: FinancialActionDraft) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            version: Set(1),
            action_id: Set(draft.action_id),
            action: Set(draft.action.map(|a| a.as_str().to_owned())),
            amount: Set(draft.amount.as_ref().map(ToString::to_string)),
            currency: Set(draft.currency.map(|c| c.as_str().to_owned())),
            user_id: Set(draft.user_id),
        }
    }

    fn field_values(draft: FinancialActionDraft) -> Vec<(Column, Value)> {
        vec![
            (Column::ActionId, draft.action_id.into()),
            (Column::Action, draft.action.map(|a| a.as_str().to_owned()).into()),
            (Column::Amount, draft.amount.as_ref().map(ToString::to_string).into()),
            (Column::Currency, draft.currency.map(|c| c.as_str().to_owned()).into()),
            (Column::UserId, draft.user_id.into()),
        ]
    }

    fn from_row(row: Model) -> Result<Self, DomainError> {
        Self::try_from(row)
    }
}
