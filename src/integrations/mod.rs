//! 外部 API 集成
//!
//! 每个外部服务一个 trait，便于在测试中替换：
//! - `AffiliateNetwork`: 联盟网络（Cuelinks）点击追踪与活动列表
//! - `MarketplaceApi`: 电商平台（Amazon PA-API）商品价格
//! - `MessagingApi`: 消息机器人（Telegram）推送
//!
//! 所有 HTTP 调用使用带全局超时的 ureq Agent，在 `spawn_blocking` 中执行，不做重试。

pub mod affiliate;
pub mod http;
pub mod marketplace;
pub mod messaging;
pub mod sigv4;

pub use affiliate::{AffiliateNetwork, Campaign, ClickRequest, CuelinksClient, ExternalId, TrackedClick};
pub use marketplace::{AmazonClient, MarketplaceApi, MarketplaceProduct};
pub use messaging::{MessagingApi, TelegramClient};
