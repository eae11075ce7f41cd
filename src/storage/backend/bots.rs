//! 消息机器人与通知设置

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{model_to_notification, notification_to_active_model};
use crate::errors::{DealError, Result};
use crate::storage::models::{BotNotificationSetting, MessagingBot, NewBot};

use migration::entities::{bot_notification, messaging_bot};

impl SeaOrmStorage {
    /// 注册机器人及其通知设置（同一事务）
    pub async fn register_bot(&self, bot: NewBot) -> Result<MessagingBot> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DealError::database_operation(format!("开始事务失败: {}", e)))?;

        let id = uuid::Uuid::new_v4().to_string();
        let model = messaging_bot::ActiveModel {
            id: Set(id.clone()),
            name: Set(bot.name),
            bot_token: Set(bot.bot_token),
            chat_id: Set(bot.chat_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DealError::database_operation(format!("注册机器人失败: {}", e)))?;

        if !bot.notifications.is_empty() {
            bot_notification::Entity::insert_many(
                bot.notifications
                    .iter()
                    .map(|n| notification_to_active_model(&id, n)),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(|e| DealError::database_operation(format!("写入通知设置失败: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| DealError::database_operation(format!("提交事务失败: {}", e)))?;

        info!("Messaging bot registered: {} ({})", model.name, model.id);
        Ok(MessagingBot {
            id: model.id,
            name: model.name,
            bot_token: model.bot_token,
            chat_id: model.chat_id,
            is_active: model.is_active,
            notifications: bot.notifications,
        })
    }

    /// 所有启用的机器人，附带通知设置
    pub async fn active_bots(&self) -> Result<Vec<MessagingBot>> {
        let bots = messaging_bot::Entity::find()
            .filter(messaging_bot::Column::IsActive.eq(true))
            .order_by_asc(messaging_bot::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询机器人失败: {}", e)))?;

        if bots.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = bots.iter().map(|b| b.id.clone()).collect();
        let mut settings: HashMap<String, Vec<BotNotificationSetting>> = HashMap::new();
        for model in bot_notification::Entity::find()
            .filter(bot_notification::Column::BotId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询通知设置失败: {}", e)))?
        {
            let bot_id = model.bot_id.clone();
            if let Some(setting) = model_to_notification(model) {
                settings.entry(bot_id).or_default().push(setting);
            }
        }

        Ok(bots
            .into_iter()
            .map(|b| MessagingBot {
                notifications: settings.remove(&b.id).unwrap_or_default(),
                id: b.id,
                name: b.name,
                bot_token: b.bot_token,
                chat_id: b.chat_id,
                is_active: b.is_active,
            })
            .collect())
    }

    pub async fn count_active_bots(&self) -> Result<u64> {
        messaging_bot::Entity::find()
            .filter(messaging_bot::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("统计机器人失败: {}", e)))
    }
}
