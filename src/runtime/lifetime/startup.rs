use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::ApiState;
use crate::config::StaticConfig;
use crate::integrations::{
    AffiliateNetwork, AmazonClient, CuelinksClient, MarketplaceApi, MessagingApi, TelegramClient,
};
use crate::services::jobs::{CampaignImportJob, JobRunner, NotificationJob, PriceSyncJob};
use crate::services::{
    ClickRedirectService, ConnectionLogger, DealClickService, FixedWindowRateLimiter,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 外部集成客户端，测试中可替换为假实现
#[derive(Clone)]
pub struct Integrations {
    pub affiliate: Arc<dyn AffiliateNetwork>,
    pub marketplace: Arc<dyn MarketplaceApi>,
    pub messaging: Arc<dyn MessagingApi>,
}

impl Integrations {
    pub fn from_config(config: &StaticConfig) -> Self {
        let timeout = Duration::from_secs(config.integrations.http_timeout_secs);
        let cuelinks = CuelinksClient::new(&config.affiliate, timeout);
        if !cuelinks.is_configured() {
            warn!("Cuelinks API key not configured; click tracking will fall back to raw URLs");
        }
        Self {
            affiliate: Arc::new(cuelinks),
            marketplace: Arc::new(AmazonClient::new(&config.marketplace, timeout)),
            messaging: Arc::new(TelegramClient::new(&config.messaging.api_base, timeout)),
        }
    }
}

/// 业务服务集合
#[derive(Clone)]
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub logger: ConnectionLogger,
    pub click_redirect: Arc<ClickRedirectService>,
    pub deal_clicks: Arc<DealClickService>,
    pub jobs: Arc<JobRunner>,
    /// cron 与 admin 各自计数，后台操作不会挤占调度器的配额
    pub cron_limiter: Arc<FixedWindowRateLimiter>,
    pub admin_limiter: Arc<FixedWindowRateLimiter>,
}

impl AppServices {
    pub fn build(
        storage: Arc<SeaOrmStorage>,
        config: &StaticConfig,
        integrations: Integrations,
    ) -> Self {
        let logger = ConnectionLogger::new(storage.clone());
        let marketplace_configured = integrations.marketplace.is_configured();

        let price_sync = PriceSyncJob::new(
            storage.clone(),
            integrations.marketplace.clone(),
            integrations.messaging.clone(),
            logger.clone(),
            config.price_sync.change_threshold_percent,
        );
        let campaign_import = CampaignImportJob::new(
            storage.clone(),
            integrations.affiliate.clone(),
            logger.clone(),
        );
        let notifications = NotificationJob::new(
            storage.clone(),
            integrations.messaging.clone(),
            logger.clone(),
            config.notifications.lookback_hours,
            config.notifications.max_deals,
        );

        Self {
            click_redirect: Arc::new(ClickRedirectService::new(
                integrations.affiliate,
                logger.clone(),
            )),
            deal_clicks: Arc::new(DealClickService::new(storage.clone())),
            jobs: Arc::new(JobRunner::new(
                storage.clone(),
                price_sync,
                campaign_import,
                notifications,
                marketplace_configured,
            )),
            cron_limiter: Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit)),
            admin_limiter: Arc::new(FixedWindowRateLimiter::from_config(&config.rate_limit)),
            logger,
            storage,
        }
    }

    pub fn api_state(&self, config: &StaticConfig) -> ApiState {
        ApiState {
            storage: self.storage.clone(),
            logger: self.logger.clone(),
            click_redirect: self.click_redirect.clone(),
            deal_clicks: self.deal_clicks.clone(),
            jobs: self.jobs.clone(),
            cron_limiter: self.cron_limiter.clone(),
            admin_limiter: self.admin_limiter.clone(),
            scheduler_secret: config.scheduler.secret.clone(),
            admin_token: config.api.admin_token.clone(),
            trusted_proxies: config.api.trusted_proxies.clone(),
        }
    }
}

/// 安装 rustls 加密后端（进程内只需一次，重复安装忽略）
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 连接数据库并组装服务
pub async fn prepare_services(config: &StaticConfig) -> Result<AppServices> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider();

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let services = AppServices::build(storage, config, Integrations::from_config(config));
    check_component_enabled(config);

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(services)
}

fn check_component_enabled(config: &StaticConfig) {
    if config.scheduler.secret.is_empty() {
        info!("Cron API is disabled (scheduler.secret not set)");
    } else if config.scheduler.secret.len() < 16 {
        warn!("WARNING: scheduler secret is very short. Consider using a stronger secret.");
    }

    if config.api.admin_token.is_empty() {
        info!("Admin API is disabled (api.admin_token not set)");
    } else if config.api.admin_token.len() < 8 {
        warn!("WARNING: Admin Token is very short. Consider using a stronger token.");
    }

    if !config.marketplace.is_configured() {
        info!("Marketplace credentials not set; price sync will report FAILED");
    }
}
