//! 定时任务触发接口（Bearer 共享密钥）

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::info;

use crate::api::helpers::{api_result, error_from_deal};
use crate::services::jobs::{ImportRequest, JobKind, JobOutcome, JobRunner};

#[derive(Debug, Deserialize)]
pub struct RunJobRequest {
    pub action: String,
}

fn job_response(outcome: JobOutcome) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(outcome)
}

pub struct CronService;

impl CronService {
    /// POST /api/cron/sync-prices
    pub async fn sync_prices(jobs: web::Data<Arc<JobRunner>>) -> impl Responder {
        info!("Cron trigger: sync-prices");
        job_response(JobOutcome::PriceSync(jobs.sync_prices().await))
    }

    /// POST /api/cron/notifications
    pub async fn notifications(jobs: web::Data<Arc<JobRunner>>) -> impl Responder {
        info!("Cron trigger: notifications");
        job_response(JobOutcome::Notifications(jobs.send_notifications().await))
    }

    /// POST /api/cron/cuelinks
    pub async fn cuelinks(jobs: web::Data<Arc<JobRunner>>) -> impl Responder {
        info!("Cron trigger: cuelinks");
        job_response(JobOutcome::CampaignImport(
            jobs.import_campaigns(&ImportRequest::scheduled()).await,
        ))
    }

    /// GET /api/cron/status
    pub async fn status(jobs: web::Data<Arc<JobRunner>>) -> impl Responder {
        api_result(jobs.status().await)
    }

    /// POST /api/cron/run {"action": "..."}
    pub async fn run(
        jobs: web::Data<Arc<JobRunner>>,
        body: web::Json<RunJobRequest>,
    ) -> HttpResponse {
        let kind = match JobKind::parse(&body.action) {
            Ok(kind) => kind,
            Err(e) => return error_from_deal(&e),
        };
        job_response(jobs.run(kind).await)
    }
}

/// 定时任务路由 `/api/cron`
pub fn cron_routes() -> actix_web::Scope {
    web::scope("/api/cron")
        .route("/sync-prices", web::post().to(CronService::sync_prices))
        .route("/notifications", web::post().to(CronService::notifications))
        .route("/cuelinks", web::post().to(CronService::cuelinks))
        .route("/status", web::get().to(CronService::status))
        .route("/run", web::post().to(CronService::run))
}
