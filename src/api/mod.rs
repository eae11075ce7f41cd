//! HTTP API
//!
//! - `/api/cuelinks/click`: 出站点击跳转
//! - `/api/deals/{id}/*`: 点击计数
//! - `/api/cron/*`: 定时任务触发（限流 + scheduler 密钥）
//! - `/api/admin/*`: 活动导入与连接日志（限流 + admin token）
//! - `/health/*`: 探针

pub mod error_code;
pub mod helpers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{error::InternalError, web};

use crate::services::jobs::JobRunner;
use crate::services::{
    ClickRedirectService, ConnectionLogger, DealClickService, FixedWindowRateLimiter,
};
use crate::storage::SeaOrmStorage;
use error_code::ErrorCode;
use helpers::error_response;
use middleware::{BearerAuth, RateLimitGuard};
use services::{admin_routes, click_routes, cron_routes, deal_routes, health_routes};

/// 路由依赖的共享状态，每个 worker 克隆一份
#[derive(Clone)]
pub struct ApiState {
    pub storage: Arc<SeaOrmStorage>,
    pub logger: ConnectionLogger,
    pub click_redirect: Arc<ClickRedirectService>,
    pub deal_clicks: Arc<DealClickService>,
    pub jobs: Arc<JobRunner>,
    pub cron_limiter: Arc<FixedWindowRateLimiter>,
    pub admin_limiter: Arc<FixedWindowRateLimiter>,
    pub scheduler_secret: String,
    pub admin_token: String,
    pub trusted_proxies: Vec<String>,
}

/// 注册全部路由；受保护的 scope 先限流再认证，cron 与 admin 各用一个限流器
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &ApiState) {
    cfg.app_data(web::Data::new(state.storage.clone()))
        .app_data(web::Data::new(state.logger.clone()))
        .app_data(web::Data::new(state.click_redirect.clone()))
        .app_data(web::Data::new(state.deal_clicks.clone()))
        .app_data(web::Data::new(state.jobs.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &err.to_string());
            InternalError::from_response(err, resp).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            let resp = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &err.to_string());
            InternalError::from_response(err, resp).into()
        }))
        .service(health_routes())
        .service(click_routes())
        .service(deal_routes())
        .service(
            cron_routes()
                .wrap(BearerAuth::new(&state.scheduler_secret, "scheduler"))
                .wrap(RateLimitGuard::new(
                    state.cron_limiter.clone(),
                    &state.trusted_proxies,
                )),
        )
        .service(
            admin_routes()
                .wrap(BearerAuth::new(&state.admin_token, "admin"))
                .wrap(RateLimitGuard::new(
                    state.admin_limiter.clone(),
                    &state.trusted_proxies,
                )),
        );
}
