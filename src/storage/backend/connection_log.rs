//! 连接日志：只追加，不提供更新/删除

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::SeaOrmStorage;
use super::converters::model_to_log_entry;
use crate::errors::{DealError, Result};
use crate::storage::models::{ConnectionLogEntry, NewLogEntry};

use migration::entities::connection_log;

impl SeaOrmStorage {
    pub async fn append_log(&self, entry: NewLogEntry) -> Result<ConnectionLogEntry> {
        let model = connection_log::ActiveModel {
            id: NotSet,
            network_id: Set(entry.network_id),
            integration_type: Set(entry.integration_type.as_ref().to_string()),
            action: Set(entry.action),
            status: Set(entry.status.as_ref().to_string()),
            message: Set(entry.message),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| DealError::database_operation(format!("写入连接日志失败: {}", e)))?;

        Ok(model_to_log_entry(model))
    }

    /// 最近的日志，可按 network_id 过滤
    pub async fn recent_logs(
        &self,
        network_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<ConnectionLogEntry>> {
        let mut query = connection_log::Entity::find();
        if let Some(network_id) = network_id {
            query = query.filter(connection_log::Column::NetworkId.eq(network_id));
        }

        let models = query
            .order_by_desc(connection_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询连接日志失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_log_entry).collect())
    }
}
