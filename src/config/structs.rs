use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含基础设施配置与外部集成凭据：
/// - server / database / logging: 基础设施
/// - api / scheduler / rate_limit: 接口鉴权与限流
/// - affiliate / marketplace / messaging / integrations: 外部 API
/// - price_sync / notifications: 定时任务参数
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub affiliate: AffiliateConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub price_sync: PriceSyncConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl StaticConfig {
    /// 从 config.toml 和环境变量加载配置
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    /// 从指定 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML > 默认值
    /// ENV 前缀：DT，分隔符：__
    /// 示例：DT__SERVER__PORT=9999
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 DT，分隔符 __
            .add_source(
                Environment::with_prefix("DT")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// HTTP 接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 管理接口 Bearer token，为空时管理接口全部拒绝
    #[serde(default)]
    pub admin_token: String,
    /// 可信反向代理（IP 或 CIDR），只有来自这些地址的 X-Forwarded-For 才会被采信
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 定时任务触发配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerConfig {
    /// 调度器共享密钥，为空时任务接口全部拒绝
    #[serde(default)]
    pub secret: String,
}

/// 固定窗口限流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

/// 联盟网络（Cuelinks）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateConfig {
    #[serde(default = "default_affiliate_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_affiliate_country_id")]
    pub country_id: u32,
    #[serde(default = "default_affiliate_per_page")]
    pub per_page: u32,
}

/// 电商平台（Amazon PA-API）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub associate_tag: String,
    /// "in" 使用 amazon.in，其余使用 amazon.com
    #[serde(default = "default_marketplace_region")]
    pub region: String,
    /// 覆盖 API 主机（测试或代理）
    #[serde(default)]
    pub host: Option<String>,
}

impl MarketplaceConfig {
    pub fn is_configured(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
            && !self.associate_tag.is_empty()
    }
}

/// 消息机器人（Telegram）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_messaging_api_base")]
    pub api_base: String,
}

/// 外部 HTTP 调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

/// 价格同步任务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceSyncConfig {
    /// 价格变化超过该百分比才更新关联优惠
    #[serde(default)]
    pub change_threshold_percent: f64,
}

/// 通知推送任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_notifications_lookback_hours")]
    pub lookback_hours: i64,
    #[serde(default = "default_notifications_max_deals")]
    pub max_deals: u64,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://deals.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_cors_enabled() -> bool {
    true
}

fn default_rate_limit_max_attempts() -> u32 {
    5
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_affiliate_api_base() -> String {
    "https://www.cuelinks.com/api/v2".to_string()
}

fn default_affiliate_country_id() -> u32 {
    252
}

fn default_affiliate_per_page() -> u32 {
    100
}

fn default_marketplace_region() -> String {
    "in".to_string()
}

fn default_messaging_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_notifications_lookback_hours() -> i64 {
    24
}

fn default_notifications_max_deals() -> u64 {
    10
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: String::new(),
            trusted_proxies: Vec::new(),
            cors_enabled: default_cors_enabled(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_rate_limit_max_attempts(),
            window_secs: default_rate_limit_window_secs(),
        }
    }
}

impl Default for AffiliateConfig {
    fn default() -> Self {
        Self {
            api_base: default_affiliate_api_base(),
            api_key: String::new(),
            country_id: default_affiliate_country_id(),
            per_page: default_affiliate_per_page(),
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            associate_tag: String::new(),
            region: default_marketplace_region(),
            host: None,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_base: default_messaging_api_base(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_notifications_lookback_hours(),
            max_deals: default_notifications_max_deals(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.rate_limit.max_attempts, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.affiliate.country_id, 252);
        assert_eq!(config.affiliate.per_page, 100);
        assert_eq!(config.integrations.http_timeout_secs, 10);
        assert_eq!(config.notifications.lookback_hours, 24);
        assert_eq!(config.notifications.max_deals, 10);
        assert!(config.scheduler.secret.is_empty());
        assert!(!config.marketplace.is_configured());
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[rate_limit]"));
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.affiliate.api_base, "https://www.cuelinks.com/api/v2");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [scheduler]
            secret = "s3cret"

            [rate_limit]
            max_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(parsed.scheduler.secret, "s3cret");
        assert_eq!(parsed.rate_limit.max_attempts, 3);
        assert_eq!(parsed.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_marketplace_configured_requires_all_credentials() {
        let mut cfg = MarketplaceConfig {
            access_key: "AK".into(),
            secret_key: "SK".into(),
            ..Default::default()
        };
        assert!(!cfg.is_configured());
        cfg.associate_tag = "tag-21".into();
        assert!(cfg.is_configured());
    }
}
