//! 联盟网络（Cuelinks）客户端

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::http::{build_agent, run_blocking, upstream_error};
use crate::config::AffiliateConfig;
use crate::errors::{DealError, Result};

/// 外部系统的 id，可能是数字也可能是字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{}", n),
            ExternalId::Text(s) => f.write_str(s),
        }
    }
}

/// 点击追踪请求，缺失字段由调用方校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub campaign_id: String,
    pub redirect_url: String,
    pub sub_id_1: Option<String>,
    pub sub_id_2: Option<String>,
    pub sub_id_3: Option<String>,
}

/// campaign_id 可能以数字传入
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<ExternalId>::deserialize(deserializer)? {
        Some(id) => id.to_string(),
        None => String::new(),
    })
}

/// 点击追踪接口返回
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackedClick {
    #[serde(default)]
    pub click_id: Option<ExternalId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 联盟活动
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Campaign {
    pub id: Option<ExternalId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub affiliate_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Campaign {
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// title → campaign → deal-{id}
    pub fn display_title(&self) -> String {
        non_empty(&self.title)
            .or_else(|| non_empty(&self.campaign))
            .map(str::to_string)
            .unwrap_or_else(|| format!("deal-{}", self.id_string()))
    }

    /// 去重用的联盟链接：affiliate_url → url
    pub fn tracking_url(&self) -> Option<&str> {
        non_empty(&self.affiliate_url).or_else(|| non_empty(&self.url))
    }

    /// 解析 end_date，支持 RFC 3339、`YYYY-MM-DD HH:MM:SS` 与 `YYYY-MM-DD`（当天结束）
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        let raw = non_empty(&self.end_date)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc())
    }

    /// 没有或无法解析 end_date 的活动视为未过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date().is_some_and(|end| end < now)
    }
}

#[derive(Debug, Deserialize)]
struct CampaignList {
    #[serde(default)]
    campaigns: Vec<Campaign>,
}

#[async_trait]
pub trait AffiliateNetwork: Send + Sync {
    /// 连接日志里的 network id
    fn network_id(&self) -> &str;

    /// 生成追踪链接；任何失败都以 Err 返回，由调用方回退到原始链接
    async fn track_click(&self, request: &ClickRequest) -> Result<TrackedClick>;

    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;
}

/// 拼接点击追踪 URL，参数经过 URL 编码
pub fn build_click_url(api_base: &str, request: &ClickRequest) -> Result<Url> {
    let endpoint = format!("{}/cpc_clicks.json", api_base.trim_end_matches('/'));
    let mut params: Vec<(&str, &str)> = vec![
        ("campaign_id", request.campaign_id.as_str()),
        ("redirect_url", request.redirect_url.as_str()),
    ];
    for (key, value) in [
        ("sub_id_1", &request.sub_id_1),
        ("sub_id_2", &request.sub_id_2),
        ("sub_id_3", &request.sub_id_3),
    ] {
        if let Some(v) = non_empty(value) {
            params.push((key, v));
        }
    }
    Ok(Url::parse_with_params(&endpoint, &params)?)
}

pub fn build_campaigns_url(api_base: &str, per_page: u32, country_id: u32) -> Result<Url> {
    let endpoint = format!("{}/campaigns.json", api_base.trim_end_matches('/'));
    Ok(Url::parse_with_params(
        &endpoint,
        &[
            ("per_page", per_page.to_string()),
            ("country_id", country_id.to_string()),
        ],
    )?)
}

/// Cuelinks REST 客户端
pub struct CuelinksClient {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
    per_page: u32,
    country_id: u32,
}

impl CuelinksClient {
    pub fn new(config: &AffiliateConfig, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            per_page: config.per_page,
            country_id: config.country_id,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn auth_header(&self) -> Result<String> {
        if !self.is_configured() {
            return Err(DealError::config("Cuelinks API key not configured"));
        }
        Ok(format!("Token token={}", self.api_key))
    }

    fn get_json<T>(agent: &ureq::Agent, url: &Url, auth: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        trace!("Cuelinks GET {}", url.path());
        let resp = agent
            .get(url.as_str())
            .header("Authorization", auth)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| upstream_error("Cuelinks", e))?;

        resp.into_body()
            .read_json::<T>()
            .map_err(|e| DealError::upstream(format!("Cuelinks response parse failed: {}", e)))
    }
}

#[async_trait]
impl AffiliateNetwork for CuelinksClient {
    fn network_id(&self) -> &str {
        "cuelinks"
    }

    async fn track_click(&self, request: &ClickRequest) -> Result<TrackedClick> {
        let auth = self.auth_header()?;
        let url = build_click_url(&self.api_base, request)?;
        let agent = self.agent.clone();

        let click: TrackedClick =
            run_blocking("cuelinks click", move || Self::get_json(&agent, &url, &auth)).await?;
        debug!("Cuelinks click tracked: {:?}", click.click_id);
        Ok(click)
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let auth = self.auth_header()?;
        let url = build_campaigns_url(&self.api_base, self.per_page, self.country_id)?;
        let agent = self.agent.clone();

        let list: CampaignList =
            run_blocking("cuelinks campaigns", move || Self::get_json(&agent, &url, &auth)).await?;
        debug!("Cuelinks returned {} campaigns", list.campaigns.len());
        Ok(list.campaigns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_click_url_encodes_and_skips_empty_sub_ids() {
        let req = ClickRequest {
            campaign_id: "42".into(),
            redirect_url: "https://shop.example.com/p?a=1&b=2".into(),
            sub_id_1: Some("deal-1".into()),
            sub_id_2: Some("".into()),
            sub_id_3: None,
        };
        let url = build_click_url("https://www.cuelinks.com/api/v2/", &req).unwrap();
        assert_eq!(url.path(), "/api/v2/cpc_clicks.json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("campaign_id".to_string(), "42".to_string()),
                (
                    "redirect_url".to_string(),
                    "https://shop.example.com/p?a=1&b=2".to_string()
                ),
                ("sub_id_1".to_string(), "deal-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_campaigns_url() {
        let url = build_campaigns_url("https://www.cuelinks.com/api/v2", 100, 252).unwrap();
        assert_eq!(url.query(), Some("per_page=100&country_id=252"));
    }

    #[test]
    fn test_campaign_title_fallbacks() {
        let c: Campaign = serde_json::from_str(r#"{"id": 7, "campaign": "Big Sale"}"#).unwrap();
        assert_eq!(c.display_title(), "Big Sale");
        let c: Campaign = serde_json::from_str(r#"{"id": "x9", "title": " "}"#).unwrap();
        assert_eq!(c.display_title(), "deal-x9");
    }

    #[test]
    fn test_campaign_tracking_url_prefers_affiliate_url() {
        let c: Campaign = serde_json::from_str(
            r#"{"id": 1, "url": "https://a.example", "affiliate_url": "https://aff.example"}"#,
        )
        .unwrap();
        assert_eq!(c.tracking_url(), Some("https://aff.example"));
        let c: Campaign = serde_json::from_str(r#"{"id": 1, "url": "https://a.example"}"#).unwrap();
        assert_eq!(c.tracking_url(), Some("https://a.example"));
    }

    #[test]
    fn test_campaign_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let past: Campaign =
            serde_json::from_str(r#"{"id": 1, "end_date": "2026-04-30"}"#).unwrap();
        let today: Campaign =
            serde_json::from_str(r#"{"id": 1, "end_date": "2026-05-01"}"#).unwrap();
        let none: Campaign = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        let rfc: Campaign =
            serde_json::from_str(r#"{"id": 1, "end_date": "2026-05-01T11:00:00Z"}"#).unwrap();
        assert!(past.is_expired(now));
        assert!(!today.is_expired(now));
        assert!(!none.is_expired(now));
        assert!(rfc.is_expired(now));
    }

    #[test]
    fn test_click_request_accepts_numeric_campaign_id() {
        let req: ClickRequest =
            serde_json::from_str(r#"{"campaign_id": 42, "redirect_url": "https://a.example"}"#)
                .unwrap();
        assert_eq!(req.campaign_id, "42");
        let req: ClickRequest = serde_json::from_str(r#"{"redirect_url": "x"}"#).unwrap();
        assert!(req.campaign_id.is_empty());
    }

    #[test]
    fn test_tracked_click_accepts_numeric_id() {
        let click: TrackedClick =
            serde_json::from_str(r#"{"click_id": 123, "url": "https://t.example/x"}"#).unwrap();
        assert_eq!(click.click_id.unwrap().to_string(), "123");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = CuelinksClient::new(&AffiliateConfig::default(), Duration::from_secs(1));
        let err = client
            .track_click(&ClickRequest {
                campaign_id: "1".into(),
                redirect_url: "https://example.com".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DealError::Config(_)));
    }
}
