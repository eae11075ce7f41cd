//! Append-only log of outbound integration calls

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "connection_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 网络/机器人标识，例如 cron、cuelinks、amazon 或 bot id
    pub network_id: String,
    /// AFFILIATE / MARKETPLACE / MESSAGING / CRON
    pub integration_type: String,
    pub action: String,
    /// SUCCESS / FAILED / PARTIAL
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
