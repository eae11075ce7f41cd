use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 优惠发布状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DealStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// 连接日志状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStatus {
    Success,
    Failed,
    /// 批量任务部分条目失败
    Partial,
}

/// 外部集成类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationType {
    Affiliate,
    Marketplace,
    Messaging,
    Cron,
}

/// 机器人通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewDeal,
    PriceDrop,
    Digest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_desc: String,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub product_url: String,
    pub affiliate_url: Option<String>,
    pub coupon: Option<String>,
    pub image_url: Option<String>,
    pub status: DealStatus,
    pub is_expired: bool,
    pub category_id: Option<String>,
    pub clicks: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// 跳转用链接：优先联盟链接，否则商品原链接
    pub fn outbound_url(&self) -> &str {
        self.affiliate_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.product_url)
    }
}

/// 新建优惠
#[derive(Debug, Clone, Default)]
pub struct NewDeal {
    pub title: String,
    pub description: String,
    pub short_desc: String,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub product_url: String,
    pub affiliate_url: Option<String>,
    pub coupon: Option<String>,
    pub image_url: Option<String>,
    pub status: DealStatus,
    pub category_id: Option<String>,
}

/// 部分更新，只写入 Some 的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_desc: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<i32>,
    pub affiliate_url: Option<String>,
    pub coupon: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<DealStatus>,
    pub is_expired: Option<bool>,
}

impl DealPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 电商平台商品缓存
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedProduct {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub currency: String,
    pub image_url: Option<String>,
    pub product_url: String,
    pub deal_id: Option<String>,
    pub last_checked_at: DateTime<Utc>,
}

/// 连接日志记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLogEntry {
    pub id: i64,
    pub network_id: String,
    pub integration_type: IntegrationType,
    pub action: String,
    pub status: LogStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的连接日志
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub network_id: String,
    pub integration_type: IntegrationType,
    pub action: String,
    pub status: LogStatus,
    pub message: String,
}

impl NewLogEntry {
    pub fn new(
        network_id: impl Into<String>,
        integration_type: IntegrationType,
        action: impl Into<String>,
        status: LogStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            network_id: network_id.into(),
            integration_type,
            action: action.into(),
            status,
            message: message.into(),
        }
    }
}

/// 机器人的某一类通知设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotNotificationSetting {
    pub kind: NotificationKind,
    pub is_enabled: bool,
    pub message_template: Option<String>,
}

/// 消息机器人及其通知设置
#[derive(Debug, Clone)]
pub struct MessagingBot {
    pub id: String,
    pub name: String,
    pub bot_token: String,
    pub chat_id: Option<String>,
    pub is_active: bool,
    pub notifications: Vec<BotNotificationSetting>,
}

impl MessagingBot {
    /// 已启用的某类通知
    pub fn enabled(&self, kind: NotificationKind) -> Option<&BotNotificationSetting> {
        self.notifications
            .iter()
            .find(|n| n.kind == kind && n.is_enabled)
    }

    /// 有自定义模板时返回模板
    pub fn template_for(&self, kind: NotificationKind) -> Option<&str> {
        self.enabled(kind)
            .and_then(|n| n.message_template.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// 注册机器人
#[derive(Debug, Clone)]
pub struct NewBot {
    pub name: String,
    pub bot_token: String,
    pub chat_id: Option<String>,
    pub notifications: Vec<BotNotificationSetting>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deal_status_parse_is_case_insensitive() {
        assert_eq!(DealStatus::from_str("draft").unwrap(), DealStatus::Draft);
        assert_eq!(
            DealStatus::from_str("PUBLISHED").unwrap(),
            DealStatus::Published
        );
        assert!(DealStatus::from_str("deleted").is_err());
    }

    #[test]
    fn test_enum_storage_strings() {
        assert_eq!(LogStatus::Partial.as_ref(), "PARTIAL");
        assert_eq!(IntegrationType::Marketplace.as_ref(), "MARKETPLACE");
        assert_eq!(NotificationKind::PriceDrop.as_ref(), "PRICE_DROP");
        assert_eq!(
            serde_json::to_string(&NotificationKind::NewDeal).unwrap(),
            "\"NEW_DEAL\""
        );
    }

    #[test]
    fn test_bot_template_only_when_enabled() {
        let bot = MessagingBot {
            id: "b1".into(),
            name: "bot".into(),
            bot_token: "t".into(),
            chat_id: Some("42".into()),
            is_active: true,
            notifications: vec![
                BotNotificationSetting {
                    kind: NotificationKind::NewDeal,
                    is_enabled: false,
                    message_template: Some("{title}".into()),
                },
                BotNotificationSetting {
                    kind: NotificationKind::PriceDrop,
                    is_enabled: true,
                    message_template: Some("  ".into()),
                },
            ],
        };
        assert!(bot.enabled(NotificationKind::NewDeal).is_none());
        assert!(bot.enabled(NotificationKind::PriceDrop).is_some());
        assert_eq!(bot.template_for(NotificationKind::PriceDrop), None);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(DealPatch::default().is_empty());
        let patch = DealPatch {
            is_expired: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
