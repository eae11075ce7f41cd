use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthResponse<'a> {
    pub status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health Service
///
/// 直接调用 storage，探针需要快速响应
pub struct HealthService;

impl HealthService {
    /// 存活探针，始终 200
    pub async fn liveness_check() -> impl Responder {
        HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            database: None,
            error: None,
        })
    }

    /// 就绪探针，检查数据库连接
    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        trace!("Received readiness check request");
        let backend = storage.backend_name();

        let failure = match tokio::time::timeout(READY_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!("Readiness check failed: {}", e);
                Some("database error".to_string())
            }
            Err(_) => {
                error!("Readiness check timeout");
                Some("timeout".to_string())
            }
        };

        match failure {
            None => HttpResponse::Ok().json(HealthResponse {
                status: "ready",
                database: Some(backend),
                error: None,
            }),
            Some(err) => HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unavailable",
                database: Some(backend),
                error: Some(err),
            }),
        }
    }
}

/// 健康检查路由 `/health`
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
}
