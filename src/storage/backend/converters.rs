//! Entity Model ↔ 领域类型转换

use std::str::FromStr;

use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{
    BotNotificationSetting, CachedProduct, ConnectionLogEntry, Deal, DealStatus, IntegrationType,
    LogStatus, NotificationKind,
};
use migration::entities::{bot_notification, connection_log, deal, marketplace_product};

pub fn model_to_deal(model: deal::Model) -> Deal {
    let status = DealStatus::from_str(&model.status).unwrap_or_else(|_| {
        warn!("Unknown deal status '{}' on {}", model.status, model.id);
        DealStatus::Draft
    });

    Deal {
        id: model.id,
        title: model.title,
        slug: model.slug,
        description: model.description,
        short_desc: model.short_desc,
        current_price: model.current_price,
        original_price: model.original_price,
        discount: model.discount,
        product_url: model.product_url,
        affiliate_url: model.affiliate_url,
        coupon: model.coupon,
        image_url: model.image_url,
        status,
        is_expired: model.is_expired,
        category_id: model.category_id,
        clicks: model.clicks.max(0) as u64,
        views: model.views.max(0) as u64,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn model_to_product(model: marketplace_product::Model) -> CachedProduct {
    CachedProduct {
        external_id: model.external_id,
        title: model.title,
        description: model.description,
        current_price: model.current_price,
        original_price: model.original_price,
        currency: model.currency,
        image_url: model.image_url,
        product_url: model.product_url,
        deal_id: model.deal_id,
        last_checked_at: model.last_checked_at,
    }
}

pub fn product_to_active_model(product: &CachedProduct) -> marketplace_product::ActiveModel {
    marketplace_product::ActiveModel {
        external_id: Set(product.external_id.clone()),
        title: Set(product.title.clone()),
        description: Set(product.description.clone()),
        current_price: Set(product.current_price),
        original_price: Set(product.original_price),
        currency: Set(product.currency.clone()),
        image_url: Set(product.image_url.clone()),
        product_url: Set(product.product_url.clone()),
        deal_id: Set(product.deal_id.clone()),
        last_checked_at: Set(product.last_checked_at),
    }
}

/// 日志记录中未知的枚举值回退为 Cron / Failed
pub fn model_to_log_entry(model: connection_log::Model) -> ConnectionLogEntry {
    ConnectionLogEntry {
        id: model.id,
        integration_type: IntegrationType::from_str(&model.integration_type)
            .unwrap_or(IntegrationType::Cron),
        status: LogStatus::from_str(&model.status).unwrap_or(LogStatus::Failed),
        network_id: model.network_id,
        action: model.action,
        message: model.message,
        created_at: model.created_at,
    }
}

/// 无法识别类型的通知设置会被丢弃
pub fn model_to_notification(model: bot_notification::Model) -> Option<BotNotificationSetting> {
    let kind = NotificationKind::from_str(&model.kind).ok()?;
    Some(BotNotificationSetting {
        kind,
        is_enabled: model.is_enabled,
        message_template: model.message_template,
    })
}

pub fn notification_to_active_model(
    bot_id: &str,
    setting: &BotNotificationSetting,
) -> bot_notification::ActiveModel {
    bot_notification::ActiveModel {
        id: NotSet,
        bot_id: Set(bot_id.to_string()),
        kind: Set(setting.kind.as_ref().to_string()),
        is_enabled: Set(setting.is_enabled),
        message_template: Set(setting.message_template.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn deal_model(status: &str) -> deal::Model {
        deal::Model {
            id: "d1".into(),
            title: "Deal".into(),
            slug: "deal".into(),
            description: String::new(),
            short_desc: String::new(),
            current_price: Some(10.0),
            original_price: None,
            discount: None,
            product_url: "https://example.com".into(),
            affiliate_url: None,
            coupon: None,
            image_url: None,
            status: status.into(),
            is_expired: false,
            category_id: None,
            clicks: -3,
            views: 7,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_deal_parses_status() {
        let deal = model_to_deal(deal_model("PUBLISHED"));
        assert_eq!(deal.status, DealStatus::Published);
        assert_eq!(deal.views, 7);
    }

    #[test]
    fn test_model_to_deal_clamps_negative_counter_and_unknown_status() {
        let deal = model_to_deal(deal_model("weird"));
        assert_eq!(deal.status, DealStatus::Draft);
        assert_eq!(deal.clicks, 0);
    }

    #[test]
    fn test_unknown_notification_kind_dropped() {
        let model = bot_notification::Model {
            id: 1,
            bot_id: "b".into(),
            kind: "WEEKLY".into(),
            is_enabled: true,
            message_template: None,
        };
        assert!(model_to_notification(model).is_none());
    }
}
