//! 联盟活动导入
//!
//! 以标题或联盟链接作为自然键去重，重复运行不会产生重复优惠。
//! 定时触发时还会刷新已存在的优惠：同步描述、链接与优惠码，过期活动归档。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{JobReport, summary_status};
use crate::errors::Result;
use crate::integrations::{AffiliateNetwork, Campaign};
use crate::services::ConnectionLogger;
use crate::storage::{
    Deal, DealPatch, DealStatus, IntegrationType, LogStatus, NewDeal, SeaOrmStorage,
};
use crate::utils::truncate_chars;

pub const CAMPAIGN_IMPORT_ACTION: &str = "CAMPAIGN_IMPORT";

const IMPORT_CATEGORY_SLUG: &str = "cuelinks";
const IMPORT_CATEGORY_NAME: &str = "Cuelinks";
const IMPORT_CATEGORY_ICON: &str = "🔗";
const SHORT_DESC_CHARS: usize = 200;

/// 导入请求；campaign_ids 为空时导入全部活动
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub campaign_ids: Option<Vec<String>>,
    #[serde(default)]
    pub status: DealStatus,
    /// 已存在的优惠是否按活动数据刷新，仅定时任务开启
    #[serde(skip)]
    pub refresh_existing: bool,
}

impl ImportRequest {
    /// 定时任务使用的请求：导入全部活动并刷新已存在的优惠
    pub fn scheduled() -> Self {
        Self {
            refresh_existing: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignImportSummary {
    pub fetched: u32,
    pub imported: u32,
    pub skipped: u32,
    pub expired: u32,
    pub failed: u32,
    /// 跳过的优惠中被刷新或归档的数量，已计入 skipped
    pub refreshed: u32,
    pub archived: u32,
}

enum ItemOutcome {
    Imported,
    Skipped,
    Refreshed { archived: bool },
    Expired,
}

pub struct CampaignImportJob {
    storage: Arc<SeaOrmStorage>,
    network: Arc<dyn AffiliateNetwork>,
    logger: ConnectionLogger,
}

impl CampaignImportJob {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        network: Arc<dyn AffiliateNetwork>,
        logger: ConnectionLogger,
    ) -> Self {
        Self {
            storage,
            network,
            logger,
        }
    }

    pub async fn run(&self, request: &ImportRequest) -> JobReport<CampaignImportSummary> {
        let mut summary = CampaignImportSummary::default();

        let campaigns = match self.network.list_campaigns().await {
            Ok(campaigns) => campaigns,
            Err(e) => {
                let message = format!("Campaign import aborted: {}", e.message());
                warn!("{}", message);
                self.log_summary(LogStatus::Failed, &message).await;
                return JobReport::failed(message, summary);
            }
        };

        let wanted: Option<HashSet<&str>> = request
            .campaign_ids
            .as_ref()
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.iter().map(|id| id.trim()).collect());
        let selected: Vec<Campaign> = campaigns
            .into_iter()
            .filter(|c| {
                wanted
                    .as_ref()
                    .is_none_or(|ids| ids.contains(c.id_string().as_str()))
            })
            .collect();
        summary.fetched = selected.len() as u32;
        debug!("Campaign import: {} campaigns selected", summary.fetched);

        let category_id = if selected.is_empty() {
            None
        } else {
            match self
                .storage
                .ensure_category(
                    IMPORT_CATEGORY_SLUG,
                    IMPORT_CATEGORY_NAME,
                    Some(IMPORT_CATEGORY_ICON),
                )
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    let message = format!("Campaign import aborted: {}", e.message());
                    self.log_summary(LogStatus::Failed, &message).await;
                    return JobReport::failed(message, summary);
                }
            }
        };

        for campaign in &selected {
            match self.import_one(campaign, request, category_id.clone()).await {
                Ok(ItemOutcome::Imported) => summary.imported += 1,
                Ok(ItemOutcome::Skipped) => summary.skipped += 1,
                Ok(ItemOutcome::Refreshed { archived }) => {
                    summary.skipped += 1;
                    summary.refreshed += 1;
                    if archived {
                        summary.archived += 1;
                    }
                }
                Ok(ItemOutcome::Expired) => summary.expired += 1,
                Err(e) => {
                    warn!("Failed to import campaign {}: {}", campaign.id_string(), e);
                    summary.failed += 1;
                }
            }
        }

        let mut message = format!(
            "Imported {} campaigns, {} skipped, {} expired, {} failed",
            summary.imported, summary.skipped, summary.expired, summary.failed
        );
        if request.refresh_existing {
            message.push_str(&format!(
                ", {} refreshed, {} archived",
                summary.refreshed, summary.archived
            ));
        }
        info!("{}", message);
        self.log_summary(summary_status(summary.failed), &message).await;
        JobReport::completed(message, summary)
    }

    async fn import_one(
        &self,
        campaign: &Campaign,
        request: &ImportRequest,
        category_id: Option<String>,
    ) -> Result<ItemOutcome> {
        let title = campaign.display_title();
        let tracking_url = campaign.tracking_url();
        let expired = campaign.is_expired(Utc::now());

        if let Some(existing) = self
            .storage
            .find_duplicate_deal(&title, tracking_url)
            .await?
        {
            debug!(
                "Campaign {} already imported as deal {}",
                campaign.id_string(),
                existing.id
            );
            if !request.refresh_existing {
                return Ok(ItemOutcome::Skipped);
            }
            let patch = refresh_patch(&existing, campaign, expired);
            if patch.is_empty() {
                return Ok(ItemOutcome::Skipped);
            }
            let archived = patch.status == Some(DealStatus::Archived);
            self.storage.update_deal(&existing.id, patch).await?;
            if archived {
                info!(
                    "Deal {} archived, campaign {} has ended",
                    existing.id,
                    campaign.id_string()
                );
            }
            return Ok(ItemOutcome::Refreshed { archived });
        }

        if expired {
            return Ok(ItemOutcome::Expired);
        }

        let description = campaign.description.clone().unwrap_or_default();
        let product_url = campaign
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| tracking_url.map(str::to_string))
            .unwrap_or_default();

        self.storage
            .create_deal(NewDeal {
                title,
                short_desc: truncate_chars(&description, SHORT_DESC_CHARS),
                description,
                current_price: Some(0.0),
                original_price: Some(0.0),
                discount: None,
                product_url,
                affiliate_url: tracking_url.map(str::to_string),
                coupon: campaign.coupon_code.clone().filter(|c| !c.is_empty()),
                image_url: campaign.image_url.clone().filter(|u| !u.is_empty()),
                status: request.status,
                category_id,
            })
            .await?;
        Ok(ItemOutcome::Imported)
    }

    async fn log_summary(&self, status: LogStatus, message: &str) {
        self.logger
            .record(
                super::CRON_NETWORK_ID,
                IntegrationType::Cron,
                CAMPAIGN_IMPORT_ACTION,
                status,
                message,
            )
            .await;
    }
}

/// 只包含与活动数据不一致的字段；活动结束后标记过期并归档
fn refresh_patch(existing: &Deal, campaign: &Campaign, expired: bool) -> DealPatch {
    fn changed<T: PartialEq>(current: &T, fresh: Option<T>) -> Option<T> {
        fresh.filter(|value| value != current)
    }

    let description = campaign.description.clone().filter(|d| !d.is_empty());
    DealPatch {
        short_desc: changed(
            &existing.short_desc,
            description.as_deref().map(|d| truncate_chars(d, SHORT_DESC_CHARS)),
        ),
        description: changed(&existing.description, description),
        affiliate_url: changed(
            &existing.affiliate_url,
            campaign.tracking_url().map(|u| Some(u.to_string())),
        )
        .flatten(),
        coupon: changed(
            &existing.coupon,
            campaign.coupon_code.clone().filter(|c| !c.is_empty()).map(Some),
        )
        .flatten(),
        image_url: changed(
            &existing.image_url,
            campaign.image_url.clone().filter(|u| !u.is_empty()).map(Some),
        )
        .flatten(),
        is_expired: changed(&existing.is_expired, Some(expired)),
        status: (expired && existing.status != DealStatus::Archived)
            .then_some(DealStatus::Archived),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_request_defaults_to_draft() {
        let req: ImportRequest = serde_json::from_str(r#"{"campaignIds": ["123"]}"#).unwrap();
        assert_eq!(req.status, DealStatus::Draft);
        assert_eq!(req.campaign_ids, Some(vec!["123".to_string()]));

        let req: ImportRequest = serde_json::from_str(r#"{"status": "PUBLISHED"}"#).unwrap();
        assert_eq!(req.status, DealStatus::Published);
        assert!(req.campaign_ids.is_none());
    }

    #[test]
    fn test_refresh_is_only_enabled_for_scheduled_runs() {
        let req: ImportRequest = serde_json::from_str(r#"{"refreshExisting": true}"#).unwrap();
        assert!(!req.refresh_existing);
        assert!(ImportRequest::scheduled().refresh_existing);
        assert!(ImportRequest::scheduled().campaign_ids.is_none());
    }
}
