//! 集成测试共享的夹具：临时 SQLite 存储与外部 API 的假实现

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use dealtracker::config::{DatabaseConfig, StaticConfig};
use dealtracker::errors::{DealError, Result};
use dealtracker::integrations::{
    AffiliateNetwork, Campaign, ClickRequest, MarketplaceApi, MarketplaceProduct, MessagingApi,
    TrackedClick,
};
use dealtracker::runtime::lifetime::startup::{AppServices, Integrations};
use dealtracker::storage::{
    BotNotificationSetting, Deal, DealStatus, NewBot, NewDeal, NotificationKind, SeaOrmStorage,
    StorageFactory,
};

/// 创建临时 SQLite 数据库的存储实例，TempDir 需要在测试期间保持存活
pub async fn temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };
    let storage = StorageFactory::create(&config)
        .await
        .expect("Failed to create storage");
    (storage, temp_dir)
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.scheduler.secret = "cron-secret-for-tests".to_string();
    config.api.admin_token = "admin-token-for-tests".to_string();
    config.rate_limit.max_attempts = 3;
    config.rate_limit.window_secs = 60;
    config
}

pub fn build_services(storage: Arc<SeaOrmStorage>, integrations: Integrations) -> AppServices {
    AppServices::build(storage, &test_config(), integrations)
}

pub fn fake_integrations(
    affiliate: Arc<FakeAffiliate>,
    marketplace: Arc<FakeMarketplace>,
    messaging: Arc<FakeMessaging>,
) -> Integrations {
    Integrations {
        affiliate,
        marketplace,
        messaging,
    }
}

pub fn new_deal(title: &str, status: DealStatus) -> NewDeal {
    NewDeal {
        title: title.to_string(),
        description: format!("{} description", title),
        short_desc: format!("{} short", title),
        current_price: Some(900.0),
        original_price: Some(1000.0),
        discount: Some(10),
        product_url: format!(
            "https://shop.example.com/{}",
            title.to_lowercase().replace(' ', "-")
        ),
        status,
        ..Default::default()
    }
}

pub async fn create_deal(storage: &SeaOrmStorage, title: &str, status: DealStatus) -> Deal {
    storage
        .create_deal(new_deal(title, status))
        .await
        .expect("Failed to create deal")
}

pub fn campaign(json: serde_json::Value) -> Campaign {
    serde_json::from_value(json).expect("invalid campaign fixture")
}

pub fn bot(name: &str, chat_id: Option<&str>, kinds: &[NotificationKind]) -> NewBot {
    NewBot {
        name: name.to_string(),
        bot_token: format!("{}-token", name),
        chat_id: chat_id.map(str::to_string),
        notifications: kinds
            .iter()
            .map(|kind| BotNotificationSetting {
                kind: *kind,
                is_enabled: true,
                message_template: None,
            })
            .collect(),
    }
}

/// 可编排的联盟网络
#[derive(Default)]
pub struct FakeAffiliate {
    pub campaigns: Vec<Campaign>,
    pub fail_clicks: bool,
    pub fail_list: bool,
    pub clicks: Mutex<Vec<ClickRequest>>,
}

impl FakeAffiliate {
    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        Self {
            campaigns,
            ..Default::default()
        }
    }
}

#[async_trait]
impl AffiliateNetwork for FakeAffiliate {
    fn network_id(&self) -> &str {
        "cuelinks"
    }

    async fn track_click(&self, request: &ClickRequest) -> Result<TrackedClick> {
        self.clicks.lock().unwrap().push(request.clone());
        if self.fail_clicks {
            return Err(DealError::upstream("Cuelinks API error: 500"));
        }
        Ok(TrackedClick {
            click_id: Some(dealtracker::integrations::ExternalId::Number(777)),
            url: Some(format!("https://track.example/c/{}", request.campaign_id)),
            status: Some("success".to_string()),
            message: None,
        })
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        if self.fail_list {
            return Err(DealError::upstream("Cuelinks API error: 503"));
        }
        Ok(self.campaigns.clone())
    }
}

/// 按商品 id 返回固定价格的电商平台
pub struct FakeMarketplace {
    pub configured: bool,
    pub prices: HashMap<String, f64>,
}

impl FakeMarketplace {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        Self {
            configured: true,
            prices: prices.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            prices: HashMap::new(),
        }
    }
}

#[async_trait]
impl MarketplaceApi for FakeMarketplace {
    fn name(&self) -> &str {
        "Amazon"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_product(&self, external_id: &str) -> Result<Option<MarketplaceProduct>> {
        Ok(self.prices.get(external_id).map(|price| MarketplaceProduct {
            external_id: external_id.to_string(),
            title: format!("Product {}", external_id),
            description: None,
            current_price: Some(*price),
            original_price: None,
            currency: "INR".to_string(),
            image_url: None,
            product_url: format!("https://www.amazon.in/dp/{}", external_id),
        }))
    }
}

/// 记录所有发送的消息，指定 token 的发送会失败
#[derive(Default)]
pub struct FakeMessaging {
    pub failing_tokens: HashSet<String>,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl FakeMessaging {
    pub fn failing_for(token: &str) -> Self {
        Self {
            failing_tokens: HashSet::from([token.to_string()]),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingApi for FakeMessaging {
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<()> {
        if self.failing_tokens.contains(bot_token) {
            return Err(DealError::upstream("Telegram API error: Forbidden"));
        }
        self.sent.lock().unwrap().push((
            bot_token.to_string(),
            chat_id.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}
