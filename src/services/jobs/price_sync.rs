//! 电商价格同步
//!
//! 遍历关联到已发布优惠的缓存商品，拉取最新价格并刷新缓存；
//! 价格变化超过阈值时回写优惠，降价时推送提醒。

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::templates::render_price_drop;
use super::{JobReport, summary_status};
use crate::errors::{DealError, Result};
use crate::integrations::{MarketplaceApi, MarketplaceProduct, MessagingApi};
use crate::services::ConnectionLogger;
use crate::storage::{
    CachedProduct, Deal, DealPatch, IntegrationType, LogStatus, NotificationKind, SeaOrmStorage,
};
use crate::utils::calculate_discount;
use crate::utils::pricing::change_percent;

pub const PRICE_SYNC_ACTION: &str = "PRICE_SYNC";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSyncSummary {
    pub synced: u32,
    pub failed: u32,
    pub price_changes: u32,
    pub price_drops: u32,
}

pub struct PriceSyncJob {
    storage: Arc<SeaOrmStorage>,
    marketplace: Arc<dyn MarketplaceApi>,
    messaging: Arc<dyn MessagingApi>,
    logger: ConnectionLogger,
    change_threshold_percent: f64,
}

/// 单个商品的同步结果
enum ItemOutcome {
    Unchanged,
    Changed { dropped: bool },
}

impl PriceSyncJob {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        marketplace: Arc<dyn MarketplaceApi>,
        messaging: Arc<dyn MessagingApi>,
        logger: ConnectionLogger,
        change_threshold_percent: f64,
    ) -> Self {
        Self {
            storage,
            marketplace,
            messaging,
            logger,
            change_threshold_percent,
        }
    }

    pub async fn run(&self) -> JobReport<PriceSyncSummary> {
        let mut summary = PriceSyncSummary::default();

        if !self.marketplace.is_configured() {
            let message = format!("{} credentials not configured", self.marketplace.name());
            warn!("Price sync skipped: {}", message);
            self.log_summary(LogStatus::Failed, &message).await;
            return JobReport::failed(message, summary);
        }

        let linked = match self.storage.linked_products().await {
            Ok(linked) => linked,
            Err(e) => {
                let message = format!("Price sync aborted: {}", e.message());
                self.log_summary(LogStatus::Failed, &message).await;
                return JobReport::failed(message, summary);
            }
        };
        debug!("Price sync: {} linked products", linked.len());

        for (product, deal) in linked {
            match self.sync_one(&product, &deal).await {
                Ok(outcome) => {
                    summary.synced += 1;
                    if let ItemOutcome::Changed { dropped } = outcome {
                        summary.price_changes += 1;
                        if dropped {
                            summary.price_drops += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Price sync failed for {}: {}", product.external_id, e);
                    summary.failed += 1;
                }
            }
        }

        let message = format!(
            "Synced {} products, {} failed, {} price changes, {} price drops",
            summary.synced, summary.failed, summary.price_changes, summary.price_drops
        );
        info!("{}", message);
        self.log_summary(summary_status(summary.failed), &message).await;
        JobReport::completed(message, summary)
    }

    async fn sync_one(&self, product: &CachedProduct, deal: &Deal) -> Result<ItemOutcome> {
        let fresh = self
            .marketplace
            .fetch_product(&product.external_id)
            .await?
            .ok_or_else(|| {
                DealError::not_found(format!(
                    "Product {} not returned by {}",
                    product.external_id,
                    self.marketplace.name()
                ))
            })?;
        let new_price = fresh.current_price.ok_or_else(|| {
            DealError::upstream(format!(
                "Product {} has no price",
                product.external_id
            ))
        })?;

        // 缓存价格是下次比较的基准，只有优惠写回成功后才能刷新
        let old_price = product.current_price;
        let changed = match old_price {
            None => true,
            Some(old) => change_percent(old, new_price) > self.change_threshold_percent,
        };
        let cached = to_cached(fresh, product.deal_id.clone());
        if !changed {
            self.storage.upsert_product(&cached).await?;
            return Ok(ItemOutcome::Unchanged);
        }

        let dropped = old_price.is_some_and(|old| new_price < old);
        let patch = DealPatch {
            current_price: Some(new_price),
            discount: deal
                .original_price
                .map(|original| calculate_discount(original, new_price)),
            is_expired: dropped.then_some(false),
            ..Default::default()
        };
        let updated = self.storage.update_deal(&deal.id, patch).await?;
        self.storage.upsert_product(&cached).await?;
        debug!(
            "Deal {} price {:?} -> {}",
            updated.id, old_price, new_price
        );

        if let (true, Some(old)) = (dropped, old_price) {
            self.notify_price_drop(&updated, old, new_price).await;
        }
        Ok(ItemOutcome::Changed { dropped })
    }

    /// 推送失败只记录，不影响该商品的同步结果
    async fn notify_price_drop(&self, deal: &Deal, old_price: f64, new_price: f64) {
        let bots = match self.storage.active_bots().await {
            Ok(bots) => bots,
            Err(e) => {
                warn!("Failed to load bots for price drop alert: {}", e);
                return;
            }
        };

        for bot in bots {
            let Some(chat_id) = bot.chat_id.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            if bot.enabled(NotificationKind::PriceDrop).is_none() {
                continue;
            }
            let text = render_price_drop(
                bot.template_for(NotificationKind::PriceDrop),
                deal,
                old_price,
                new_price,
            );
            if let Err(e) = self.messaging.send_message(&bot.bot_token, chat_id, &text).await {
                warn!("Price drop alert to bot {} failed: {}", bot.name, e);
            }
        }
    }

    async fn log_summary(&self, status: LogStatus, message: &str) {
        self.logger
            .record(
                super::CRON_NETWORK_ID,
                IntegrationType::Cron,
                PRICE_SYNC_ACTION,
                status,
                message,
            )
            .await;
    }
}

fn to_cached(fresh: MarketplaceProduct, deal_id: Option<String>) -> CachedProduct {
    CachedProduct {
        external_id: fresh.external_id,
        title: fresh.title,
        description: fresh.description,
        current_price: fresh.current_price,
        original_price: fresh.original_price,
        currency: fresh.currency,
        image_url: fresh.image_url,
        product_url: fresh.product_url,
        deal_id,
        last_checked_at: Utc::now(),
    }
}
