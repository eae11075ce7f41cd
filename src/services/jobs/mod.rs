//! 定时同步任务
//!
//! 三个任务都可以重复或并发执行，单条失败只计数不中断；
//! 每次运行恰好写一条 CRON 汇总连接日志。
//!
//! 触发方式：`/api/cron/*` 接口（Bearer 密钥）或 CLI `run <job>`，进程内没有定时器。

mod campaign_import;
mod notifications;
mod price_sync;
pub mod templates;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::info;

pub use campaign_import::{
    CAMPAIGN_IMPORT_ACTION, CampaignImportJob, CampaignImportSummary, ImportRequest,
};
pub use notifications::{
    NOTIFICATIONS_ACTION, NotificationJob, NotificationSummary, digest_template, is_digest_target,
};
pub use price_sync::{PRICE_SYNC_ACTION, PriceSyncJob, PriceSyncSummary};

use crate::errors::{DealError, Result};
use crate::storage::{LogStatus, SeaOrmStorage};

/// 汇总日志使用的 network id
pub const CRON_NETWORK_ID: &str = "cron";

/// 任务汇总，`success=false` 表示任务整体中止
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport<T> {
    pub success: bool,
    pub message: String,
    pub result: T,
}

impl<T> JobReport<T> {
    pub fn completed(message: impl Into<String>, result: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            result,
        }
    }

    pub fn failed(message: impl Into<String>, result: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            result,
        }
    }
}

/// 没有失败为 SUCCESS，有失败为 PARTIAL
pub fn summary_status(failed: u32) -> LogStatus {
    if failed == 0 {
        LogStatus::Success
    } else {
        LogStatus::Partial
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JobKind {
    SyncPrices,
    Notifications,
    Cuelinks,
    Full,
}

impl JobKind {
    /// 解析 `/api/cron/run` 的 action
    pub fn parse(action: &str) -> Result<Self> {
        JobKind::from_str(action.trim()).map_err(|_| {
            DealError::validation(format!(
                "Invalid action: {}. Expected one of sync-prices, notifications, cuelinks, full",
                action
            ))
        })
    }
}

/// `full` 的结果，三个任务各自的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRunReport {
    pub price_sync: JobReport<PriceSyncSummary>,
    pub campaign_import: JobReport<CampaignImportSummary>,
    pub notifications: JobReport<NotificationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobOutcome {
    PriceSync(JobReport<PriceSyncSummary>),
    CampaignImport(JobReport<CampaignImportSummary>),
    Notifications(JobReport<NotificationSummary>),
    Full(JobReport<FullRunReport>),
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        match self {
            JobOutcome::PriceSync(r) => r.success,
            JobOutcome::CampaignImport(r) => r.success,
            JobOutcome::Notifications(r) => r.success,
            JobOutcome::Full(r) => r.success,
        }
    }
}

/// `/api/cron/status` 返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub linked_products: u64,
    pub active_deals: u64,
    pub total_deals: u64,
    pub active_bots: u64,
    pub marketplace_configured: bool,
}

pub struct JobRunner {
    storage: Arc<SeaOrmStorage>,
    price_sync: PriceSyncJob,
    campaign_import: CampaignImportJob,
    notifications: NotificationJob,
    marketplace_configured: bool,
}

impl JobRunner {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        price_sync: PriceSyncJob,
        campaign_import: CampaignImportJob,
        notifications: NotificationJob,
        marketplace_configured: bool,
    ) -> Self {
        Self {
            storage,
            price_sync,
            campaign_import,
            notifications,
            marketplace_configured,
        }
    }

    pub async fn sync_prices(&self) -> JobReport<PriceSyncSummary> {
        self.price_sync.run().await
    }

    pub async fn import_campaigns(&self, request: &ImportRequest) -> JobReport<CampaignImportSummary> {
        self.campaign_import.run(request).await
    }

    pub async fn send_notifications(&self) -> JobReport<NotificationSummary> {
        self.notifications.run().await
    }

    /// 三个任务并发执行
    pub async fn run_all(&self) -> JobReport<FullRunReport> {
        let request = ImportRequest::scheduled();
        let (price_sync, campaign_import, notifications) = tokio::join!(
            self.price_sync.run(),
            self.campaign_import.run(&request),
            self.notifications.run(),
        );

        let success = price_sync.success && campaign_import.success && notifications.success;
        let message = format!(
            "Price sync: {}; Campaign import: {}; Notifications: {}",
            price_sync.message, campaign_import.message, notifications.message
        );
        info!("Full run finished (success: {})", success);
        JobReport {
            success,
            message,
            result: FullRunReport {
                price_sync,
                campaign_import,
                notifications,
            },
        }
    }

    pub async fn run(&self, kind: JobKind) -> JobOutcome {
        info!("Running job: {}", kind);
        match kind {
            JobKind::SyncPrices => JobOutcome::PriceSync(self.sync_prices().await),
            JobKind::Notifications => JobOutcome::Notifications(self.send_notifications().await),
            JobKind::Cuelinks => {
                JobOutcome::CampaignImport(self.import_campaigns(&ImportRequest::scheduled()).await)
            }
            JobKind::Full => JobOutcome::Full(self.run_all().await),
        }
    }

    pub async fn status(&self) -> Result<SchedulerStatus> {
        Ok(SchedulerStatus {
            linked_products: self.storage.count_linked_products().await?,
            active_deals: self.storage.count_active_deals().await?,
            total_deals: self.storage.count_deals().await?,
            active_bots: self.storage.count_active_bots().await?,
            marketplace_configured: self.marketplace_configured,
        })
    }
}
