//! Server mode
//!
//! Starts the HTTP server with all routes and waits for Ctrl+C.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::DefaultHeaders,
    web,
};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::configure_routes;
use crate::config::{ApiConfig, get_config};
use crate::runtime::lifetime;

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(api: &ApiConfig) {
    if !api.cors_enabled {
        return;
    }
    if api.cors_allowed_origins.is_empty() {
        warn!(
            "CORS enabled but cors_allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set cors_allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// Build CORS middleware from configuration
pub fn build_cors_middleware(api: &ApiConfig) -> Cors {
    // 未启用时使用默认的同源策略
    if !api.cors_enabled {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header("Content-Type")
        .allowed_header("Authorization")
        .allowed_header("Accept")
        .max_age(3600);

    if api.cors_allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &api.cors_allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let services = lifetime::startup::prepare_services(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {}", e))?;

    services.cron_limiter.clone().spawn_purge_task();
    services.admin_limiter.clone().spawn_purge_task();

    let state = services.api_state(&config);
    let api_config = config.api.clone();
    validate_cors_config(&api_config);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let db_for_shutdown = services.storage.get_db().clone();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(build_cors_middleware(&api_config))
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .configure(move |cfg| configure_routes(cfg, &state))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(db_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
