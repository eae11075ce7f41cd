//! Per-bot notification switches and message templates

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bot_notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bot_id: String,
    /// NEW_DEAL / PRICE_DROP / DIGEST
    pub kind: String,
    pub is_enabled: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub message_template: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
