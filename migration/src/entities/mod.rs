pub mod bot_notification;
pub mod category;
pub mod connection_log;
pub mod deal;
pub mod marketplace_product;
pub mod messaging_bot;

pub use bot_notification::Entity as BotNotificationEntity;
pub use category::Entity as CategoryEntity;
pub use connection_log::Entity as ConnectionLogEntity;
pub use deal::Entity as DealEntity;
pub use marketplace_product::Entity as MarketplaceProductEntity;
pub use messaging_bot::Entity as MessagingBotEntity;
