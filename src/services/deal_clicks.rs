//! 优惠点击计数

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{DealError, Result};
use crate::storage::SeaOrmStorage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealClickResponse {
    pub deal_id: String,
    pub total_clicks: u64,
    pub affiliate_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealClickStats {
    pub deal_id: String,
    pub title: String,
    pub views: u64,
    pub clicks: u64,
    pub click_rate: f64,
    pub click_rate_label: String,
}

/// 点击率（百分比），没有浏览时为 0
pub fn click_rate(clicks: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    clicks as f64 / views as f64 * 100.0
}

pub fn click_rate_label(rate: f64) -> String {
    format!("{:.2}%", rate)
}

pub struct DealClickService {
    storage: Arc<SeaOrmStorage>,
}

impl DealClickService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn require_id(deal_id: &str) -> Result<&str> {
        let id = deal_id.trim();
        if id.is_empty() {
            return Err(DealError::validation("Deal id is required"));
        }
        Ok(id)
    }

    /// 原子自增点击数，返回本次自增后的总数
    pub async fn record_click(&self, deal_id: &str) -> Result<DealClickResponse> {
        let id = Self::require_id(deal_id)?;
        let deal = self.storage.increment_clicks(id).await?;
        debug!("Deal {} clicks -> {}", deal.id, deal.clicks);
        Ok(DealClickResponse {
            affiliate_url: deal.outbound_url().to_string(),
            deal_id: deal.id,
            total_clicks: deal.clicks,
        })
    }

    pub async fn record_view(&self, deal_id: &str) -> Result<DealClickStats> {
        let id = Self::require_id(deal_id)?;
        let deal = self.storage.increment_views(id).await?;
        Ok(Self::stats_of(deal))
    }

    pub async fn click_stats(&self, deal_id: &str) -> Result<DealClickStats> {
        let id = Self::require_id(deal_id)?;
        let deal = self
            .storage
            .get_deal(id)
            .await?
            .ok_or_else(|| DealError::not_found(format!("Deal not found: {}", id)))?;
        Ok(Self::stats_of(deal))
    }

    fn stats_of(deal: crate::storage::Deal) -> DealClickStats {
        let rate = click_rate(deal.clicks, deal.views);
        DealClickStats {
            deal_id: deal.id,
            title: deal.title,
            views: deal.views,
            clicks: deal.clicks,
            click_rate: rate,
            click_rate_label: click_rate_label(rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_rate_zero_views() {
        assert_eq!(click_rate(10, 0), 0.0);
        assert_eq!(click_rate(0, 0), 0.0);
    }

    #[test]
    fn test_click_rate_percentage() {
        assert_eq!(click_rate(5, 20), 25.0);
        assert_eq!(click_rate(30, 20), 150.0);
        assert_eq!(click_rate_label(click_rate(1, 3)), "33.33%");
        assert_eq!(click_rate_label(0.0), "0.00%");
    }

    #[test]
    fn test_response_uses_camel_case() {
        let resp = DealClickResponse {
            deal_id: "d1".into(),
            total_clicks: 3,
            affiliate_url: "https://aff.example".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["dealId"], "d1");
        assert_eq!(json["totalClicks"], 3);
    }
}
