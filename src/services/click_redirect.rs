//! 出站点击跳转
//!
//! 调用联盟网络生成追踪链接；任何失败都回退到原始 redirect_url，跳转永远不会因此中断。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ConnectionLogger;
use crate::errors::{DealError, Result};
use crate::integrations::{AffiliateNetwork, ClickRequest, ExternalId};
use crate::storage::{IntegrationType, LogStatus};
use crate::utils::validate_redirect_url;

const CLICK_ACTION: &str = "CLICK";

/// 跳转结果，url 永不为空；字段名与 Cuelinks 响应保持一致（snake_case）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickOutcome {
    pub click_id: Option<ExternalId>,
    pub url: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClickOutcome {
    pub fn is_tracked(&self) -> bool {
        self.status != "error"
    }
}

pub struct ClickRedirectService {
    network: Arc<dyn AffiliateNetwork>,
    logger: ConnectionLogger,
}

impl ClickRedirectService {
    pub fn new(network: Arc<dyn AffiliateNetwork>, logger: ConnectionLogger) -> Self {
        Self { network, logger }
    }

    fn validate(request: &ClickRequest) -> Result<()> {
        if request.campaign_id.trim().is_empty() {
            return Err(DealError::validation("campaign_id is required"));
        }
        validate_redirect_url(&request.redirect_url)?;
        Ok(())
    }

    /// 校验失败返回 Err；校验通过后一定返回可用的跳转链接
    pub async fn redirect(&self, request: &ClickRequest) -> Result<ClickOutcome> {
        Self::validate(request)?;

        let network_id = self.network.network_id().to_string();
        let outcome = match self.network.track_click(request).await {
            Ok(tracked) => {
                let url = tracked
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| request.redirect_url.clone());
                ClickOutcome {
                    click_id: tracked.click_id,
                    url,
                    status: tracked
                        .status
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "success".to_string()),
                    message: tracked.message,
                }
            }
            Err(e) => {
                warn!(
                    "Click tracking failed for campaign {}, falling back to raw URL: {}",
                    request.campaign_id, e
                );
                ClickOutcome {
                    click_id: None,
                    url: request.redirect_url.clone(),
                    status: "error".to_string(),
                    message: Some(e.message().to_string()),
                }
            }
        };

        let (status, message) = if outcome.is_tracked() {
            (
                LogStatus::Success,
                format!(
                    "Click tracked for campaign {} (click_id: {})",
                    request.campaign_id,
                    outcome
                        .click_id
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string())
                ),
            )
        } else {
            (
                LogStatus::Failed,
                format!(
                    "Click tracking failed for campaign {}: {}",
                    request.campaign_id,
                    outcome.message.as_deref().unwrap_or("unknown error")
                ),
            )
        };
        self.logger
            .record(&network_id, IntegrationType::Affiliate, CLICK_ACTION, status, message)
            .await;

        debug!("Click redirect resolved to {}", outcome.url);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(campaign: &str, url: &str) -> ClickRequest {
        ClickRequest {
            campaign_id: campaign.into(),
            redirect_url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_campaign() {
        let err = ClickRedirectService::validate(&request(" ", "https://a.example")).unwrap_err();
        assert_eq!(err.message(), "campaign_id is required");
    }

    #[test]
    fn test_validate_rejects_unsafe_redirect() {
        assert!(ClickRedirectService::validate(&request("1", "")).is_err());
        assert!(ClickRedirectService::validate(&request("1", "javascript:alert(1)")).is_err());
        assert!(ClickRedirectService::validate(&request("1", "https://shop.example/p")).is_ok());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ClickOutcome {
            click_id: None,
            url: "https://shop.example".into(),
            status: "error".into(),
            message: Some("Cuelinks API error: 500".into()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("click_id").is_some_and(|v| v.is_null()));
        assert!(json.get("clickId").is_none());
        assert_eq!(json["url"], "https://shop.example");
        assert!(!outcome.is_tracked());
    }
}
