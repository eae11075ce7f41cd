//! Admin API：活动批量导入与连接日志查询

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;

use crate::api::helpers::{api_result, error_from_deal};
use crate::errors::DealError;
use crate::services::ConnectionLogger;
use crate::services::jobs::{ImportRequest, JobOutcome, JobRunner};

const DEFAULT_LOG_LIMIT: u64 = 50;
const MAX_LOG_LIMIT: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub network: Option<String>,
    pub limit: Option<u64>,
}

pub struct AdminService;

impl AdminService {
    /// POST /api/admin/cuelinks/import
    pub async fn import_campaigns(
        jobs: web::Data<Arc<JobRunner>>,
        body: web::Json<ImportRequest>,
    ) -> HttpResponse {
        let request = body.into_inner();
        if request.campaign_ids.as_ref().is_none_or(|ids| ids.is_empty()) {
            return error_from_deal(&DealError::validation("campaignIds is required"));
        }
        HttpResponse::Ok().json(JobOutcome::CampaignImport(
            jobs.import_campaigns(&request).await,
        ))
    }

    /// GET /api/admin/connection-logs?network=&limit=
    pub async fn connection_logs(
        logger: web::Data<ConnectionLogger>,
        query: web::Query<LogQuery>,
    ) -> impl Responder {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT);
        let network = query.network.as_deref().filter(|n| !n.is_empty());
        api_result(logger.recent(network, limit).await)
    }
}

/// Admin 路由 `/api/admin`
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/api/admin")
        .route(
            "/cuelinks/import",
            web::post().to(AdminService::import_campaigns),
        )
        .route(
            "/connection-logs",
            web::get().to(AdminService::connection_logs),
        )
}
