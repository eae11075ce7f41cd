use std::sync::Arc;

use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::helpers::{api_result, error_from_deal};
use crate::integrations::ClickRequest;
use crate::services::{ClickRedirectService, DealClickService};

const DEFAULT_SOURCE: &str = "website";

/// GET 跳转的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ClickQuery {
    pub campaign_id: Option<String>,
    pub redirect_url: Option<String>,
    pub sub_id_1: Option<String>,
    pub sub_id_3: Option<String>,
    pub source: Option<String>,
}

impl ClickQuery {
    /// source 作为 sub_id_2 传给联盟网络
    pub fn into_request(self) -> ClickRequest {
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        ClickRequest {
            campaign_id: self.campaign_id.unwrap_or_default(),
            redirect_url: self.redirect_url.unwrap_or_default(),
            sub_id_1: self.sub_id_1,
            sub_id_2: Some(source),
            sub_id_3: self.sub_id_3,
        }
    }
}

pub struct ClickService;

impl ClickService {
    /// POST /api/cuelinks/click
    pub async fn track_click(
        redirector: web::Data<Arc<ClickRedirectService>>,
        body: web::Json<ClickRequest>,
    ) -> impl Responder {
        api_result(redirector.redirect(&body).await)
    }

    /// GET /api/cuelinks/click，302 跳转到追踪链接或原始链接
    pub async fn redirect_click(
        redirector: web::Data<Arc<ClickRedirectService>>,
        deal_clicks: web::Data<Arc<DealClickService>>,
        query: web::Query<ClickQuery>,
    ) -> HttpResponse {
        let request = query.into_inner().into_request();

        let outcome = match redirector.redirect(&request).await {
            Ok(outcome) => outcome,
            Err(e) => return error_from_deal(&e),
        };

        if let Some(deal_id) = request.sub_id_1.as_deref().filter(|id| !id.is_empty()) {
            match deal_clicks.record_click(deal_id).await {
                Ok(resp) => debug!("Deal {} clicks -> {}", resp.deal_id, resp.total_clicks),
                Err(e) => warn!("Failed to count click for deal {}: {}", deal_id, e),
            }
        }

        HttpResponse::Found()
            .insert_header((LOCATION, outcome.url))
            .insert_header((CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// 点击跳转路由 `/api/cuelinks`
pub fn click_routes() -> actix_web::Scope {
    web::scope("/api/cuelinks")
        .route("/click", web::post().to(ClickService::track_click))
        .route("/click", web::get().to(ClickService::redirect_click))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_source_to_website() {
        let req = ClickQuery {
            campaign_id: Some("7".into()),
            redirect_url: Some("https://a.example".into()),
            ..Default::default()
        }
        .into_request();
        assert_eq!(req.sub_id_2.as_deref(), Some("website"));

        let req = ClickQuery {
            source: Some("telegram".into()),
            ..Default::default()
        }
        .into_request();
        assert_eq!(req.sub_id_2.as_deref(), Some("telegram"));
        assert!(req.campaign_id.is_empty());
    }
}
