//! 外部集成相关表
//!
//! - connection_logs: 只追加的外部调用日志
//! - messaging_bots / bot_notifications: 消息机器人及其通知设置

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectionLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConnectionLogs::NetworkId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConnectionLogs::IntegrationType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConnectionLogs::Action).string_len(64).not_null())
                    .col(ColumnDef::new(ConnectionLogs::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ConnectionLogs::Message).text().not_null())
                    .col(
                        ColumnDef::new(ConnectionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_connection_logs_network_time")
                    .table(ConnectionLogs::Table)
                    .col(ConnectionLogs::NetworkId)
                    .col(ConnectionLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MessagingBots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MessagingBots::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MessagingBots::Name).string_len(255).not_null())
                    .col(ColumnDef::new(MessagingBots::BotToken).string_len(255).not_null())
                    .col(ColumnDef::new(MessagingBots::ChatId).string_len(64).null())
                    .col(
                        ColumnDef::new(MessagingBots::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MessagingBots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BotNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BotNotifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BotNotifications::BotId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BotNotifications::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(BotNotifications::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(BotNotifications::MessageTemplate).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bot_notifications_bot_id")
                    .table(BotNotifications::Table)
                    .col(BotNotifications::BotId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BotNotifications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MessagingBots::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ConnectionLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConnectionLogs {
    #[sea_orm(iden = "connection_logs")]
    Table,
    Id,
    NetworkId,
    IntegrationType,
    Action,
    Status,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MessagingBots {
    #[sea_orm(iden = "messaging_bots")]
    Table,
    Id,
    Name,
    BotToken,
    ChatId,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BotNotifications {
    #[sea_orm(iden = "bot_notifications")]
    Table,
    Id,
    BotId,
    Kind,
    IsEnabled,
    MessageTemplate,
}
