use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::get_config;
use crate::services::{
    AdminService, BulkUploadService, CatalogService, Clock, DownloadGateService, QuizGateService,
    RedirectLinkSource, RedirectLoopManager, SystemClock,
};
use crate::session::{MemorySessionStore, SessionStore};
use crate::storage::{SeaOrmStorage, StorageFactory};

#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub sessions: Arc<dyn SessionStore>,
    pub catalog: Arc<CatalogService>,
    pub admin: Arc<AdminService>,
    pub bulk_upload: Arc<BulkUploadService>,
    pub redirect_loop: Arc<RedirectLoopManager>,
    pub download_gate: Arc<DownloadGateService>,
    pub quiz_gate: Arc<QuizGateService>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub admin_prefix: String,
    pub health_prefix: String,
    pub interstitial_path: String,
}

impl StartupContext {
    /// Wire every service on top of an existing storage
    pub fn build(storage: Arc<SeaOrmStorage>, clock: Arc<dyn Clock>) -> Self {
        let config = get_config();

        let sessions: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::from_config(&config.session));
        let link_source: Arc<dyn RedirectLinkSource> = storage.clone();

        Self {
            catalog: Arc::new(CatalogService::new(storage.clone())),
            admin: Arc::new(AdminService::new(
                storage.clone(),
                config.gate.max_redirect_links_per_position,
            )),
            bulk_upload: Arc::new(BulkUploadService::new(storage.clone())),
            redirect_loop: Arc::new(RedirectLoopManager::new(
                link_source,
                clock.clone(),
                &config.session,
            )),
            download_gate: Arc::new(DownloadGateService::new(clock.clone(), &config.gate)),
            quiz_gate: Arc::new(QuizGateService::new(clock, &config.gate)),
            sessions,
            storage,
            route_config: RouteConfig {
                admin_prefix: config.routes.admin_prefix.clone(),
                health_prefix: config.routes.health_prefix.clone(),
                interstitial_path: config.gate.interstitial_path.clone(),
            },
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储（含迁移）、会话存储和各业务服务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let config = get_config();
    if config.admin_enabled() {
        info!("Admin API available at: {}", config.routes.admin_prefix);
    } else {
        warn!("Admin API is disabled (api.admin_password is empty)");
    }

    let context = StartupContext::build(storage, Arc::new(SystemClock));

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
