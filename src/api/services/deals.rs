use std::sync::Arc;

use actix_web::{Responder, web};

use crate::api::helpers::api_result;
use crate::services::DealClickService;

pub struct DealService;

impl DealService {
    /// POST /api/deals/{id}/click
    pub async fn record_click(
        path: web::Path<String>,
        deal_clicks: web::Data<Arc<DealClickService>>,
    ) -> impl Responder {
        api_result(deal_clicks.record_click(&path).await)
    }

    /// GET /api/deals/{id}/click
    pub async fn click_stats(
        path: web::Path<String>,
        deal_clicks: web::Data<Arc<DealClickService>>,
    ) -> impl Responder {
        api_result(deal_clicks.click_stats(&path).await)
    }

    /// POST /api/deals/{id}/view
    pub async fn record_view(
        path: web::Path<String>,
        deal_clicks: web::Data<Arc<DealClickService>>,
    ) -> impl Responder {
        api_result(deal_clicks.record_view(&path).await)
    }
}

/// 优惠计数路由 `/api/deals`
pub fn deal_routes() -> actix_web::Scope {
    web::scope("/api/deals")
        .route("/{id}/click", web::post().to(DealService::record_click))
        .route("/{id}/click", web::get().to(DealService::click_stats))
        .route("/{id}/view", web::post().to(DealService::record_view))
}
