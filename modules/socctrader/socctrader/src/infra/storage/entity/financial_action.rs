use sea_orm::entity::prelude::*;

/// Amounts are stored as decimal text so every backend round-trips them
/// exactly; `action` and `currency` hold the upper-case enum names.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_action")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub version: i64,
    pub action_id: Option<i64>,
    pub action: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
