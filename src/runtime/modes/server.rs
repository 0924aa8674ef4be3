//! Server mode
//!
//! Configures and starts the HTTP server with all routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::{AdminAuth, RequestIdMiddleware, ReturnTracker, SessionMiddleware};
use crate::api::services::{
    AppStartTime, admin::routes::admin_v1_routes, health_routes, interstitial, public_api_routes,
    redirect_routes,
};
use crate::runtime::lifetime;
use crate::runtime::lifetime::startup::StartupContext;

/// 跨域：浏览器默认同源策略
fn build_cors_middleware() -> Cors {
    Cors::default()
}

/// Register shared state and every route of the service
///
/// Middleware is applied by the caller so tests can build the same app.
pub fn configure_services(
    cfg: &mut web::ServiceConfig,
    ctx: &StartupContext,
    app_start_time: &AppStartTime,
) {
    let route = &ctx.route_config;

    cfg.app_data(web::Data::new(ctx.storage.clone()))
        .app_data(web::Data::new(ctx.catalog.clone()))
        .app_data(web::Data::new(ctx.admin.clone()))
        .app_data(web::Data::new(ctx.bulk_upload.clone()))
        .app_data(web::Data::new(ctx.redirect_loop.clone()))
        .app_data(web::Data::new(ctx.download_gate.clone()))
        .app_data(web::Data::new(ctx.quiz_gate.clone()))
        .app_data(web::Data::new(app_start_time.clone()))
        .app_data(web::JsonConfig::default().limit(1024 * 1024))
        .service(
            web::scope(&route.admin_prefix)
                .wrap(AdminAuth)
                .service(admin_v1_routes()),
        )
        .service(web::scope(&route.health_prefix).service(health_routes()))
        .service(public_api_routes())
        .service(redirect_routes())
        .route(&route.interstitial_path, web::get().to(interstitial));
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let config = crate::config::get_config();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let session_config = config.session.clone();
    let db_for_shutdown = startup.storage.get_db().clone();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(ReturnTracker::new(startup.redirect_loop.clone()))
            .wrap(SessionMiddleware::new(
                startup.sessions.clone(),
                &session_config,
            ))
            .wrap(build_cors_middleware())
            .wrap(Compress::default())
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000")),
            )
            .configure(|cfg| configure_services(cfg, &startup, &app_start_time))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&db_for_shutdown) => {
            warn!("Graceful shutdown complete");
        }
    }

    Ok(())
}
