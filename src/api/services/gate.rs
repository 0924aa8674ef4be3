//! 下载门 `/api/content/{id}/gate`
//!
//! Quality selection starts a countdown; once it runs out the sources of
//! that quality can be chosen. Free sources go through the interstitial.

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::constants::DOWNLOAD_CTA_POSITION;
use crate::services::catalog::group_by_quality;
use crate::services::download_gate::{GateSource, gate_key};
use crate::services::redirect_loop::with_return_marker;
use crate::services::{
    CatalogService, DownloadGateService, GateAction, GateState, RedirectLoopManager,
};
use crate::errors::MflixError;
use crate::session::SessionContext;
use crate::storage::DownloadLink;
use crate::utils::url_validator::validate_navigation_target;

use super::admin::{ErrorCode, ErrorScope, error_from_mflix, error_response, success_response};

#[derive(Debug, Default, Deserialize)]
pub struct GateQuery {
    pub episode_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct QualityRequest {
    pub quality: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceRequest {
    pub link_id: i32,
    #[serde(default)]
    pub mirror_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GateView {
    #[serde(flatten)]
    pub state: GateState,
    pub qualities: Vec<String>,
    /// 仅在 sources_enabled 后返回
    pub sources: Vec<DownloadLink>,
}

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    #[serde(flatten)]
    pub action: GateAction,
    /// 外链被跳转链接替换
    pub redirected: bool,
}

fn qualities(links: &[DownloadLink]) -> Vec<String> {
    group_by_quality(links.to_vec())
        .into_iter()
        .map(|g| g.quality)
        .collect()
}

fn view(state: GateState, links: Vec<DownloadLink>) -> GateView {
    let qualities = qualities(&links);
    let sources = match &state {
        GateState::SourcesEnabled { quality } => links
            .into_iter()
            .filter(|l| &l.quality == quality)
            .collect(),
        _ => Vec::new(),
    };
    GateView {
        state,
        qualities,
        sources,
    }
}

/// Load the links the gate works on, or the error response to send
async fn load_links(
    catalog: &CatalogService,
    content_id: i32,
    episode_id: Option<i32>,
) -> Result<Vec<DownloadLink>, HttpResponse> {
    catalog
        .gate_links(content_id, episode_id)
        .await
        .map_err(|e| error_from_mflix(&e, ErrorScope::Gate))
}

pub async fn get_gate(
    id: web::Path<i32>,
    query: web::Query<GateQuery>,
    session: SessionContext,
    catalog: web::Data<Arc<CatalogService>>,
    gates: web::Data<Arc<DownloadGateService>>,
) -> HttpResponse {
    let content_id = id.into_inner();
    let links = match load_links(&catalog, content_id, query.episode_id).await {
        Ok(links) => links,
        Err(resp) => return resp,
    };

    let key = gate_key(content_id, query.episode_id);
    let state = gates
        .with_gate(&session, &key, |gate| gate.state().clone())
        .await;
    success_response(view(state, links))
}

pub async fn select_quality(
    id: web::Path<i32>,
    query: web::Query<GateQuery>,
    body: web::Json<QualityRequest>,
    session: SessionContext,
    catalog: web::Data<Arc<CatalogService>>,
    gates: web::Data<Arc<DownloadGateService>>,
) -> HttpResponse {
    let content_id = id.into_inner();
    let links = match load_links(&catalog, content_id, query.episode_id).await {
        Ok(links) => links,
        Err(resp) => return resp,
    };

    let quality = body.into_inner().quality;
    if !links.iter().any(|l| l.quality == quality) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::QualityUnavailable,
            &format!("Quality '{}' is not available", quality),
        );
    }

    let key = gate_key(content_id, query.episode_id);
    let state = gates
        .with_gate(&session, &key, |gate| {
            gate.select_quality(quality);
            gate.state().clone()
        })
        .await;
    success_response(view(state, links))
}

pub async fn back_to_quality(
    id: web::Path<i32>,
    query: web::Query<GateQuery>,
    session: SessionContext,
    catalog: web::Data<Arc<CatalogService>>,
    gates: web::Data<Arc<DownloadGateService>>,
) -> HttpResponse {
    let content_id = id.into_inner();
    let links = match load_links(&catalog, content_id, query.episode_id).await {
        Ok(links) => links,
        Err(resp) => return resp,
    };

    let key = gate_key(content_id, query.episode_id);
    let state = gates
        .with_gate(&session, &key, |gate| {
            gate.back_to_quality();
            gate.state().clone()
        })
        .await;
    success_response(view(state, links))
}

#[allow(clippy::too_many_arguments)]
pub async fn choose_source(
    req: HttpRequest,
    id: web::Path<i32>,
    query: web::Query<GateQuery>,
    body: web::Json<SourceRequest>,
    session: SessionContext,
    catalog: web::Data<Arc<CatalogService>>,
    gates: web::Data<Arc<DownloadGateService>>,
    redirects: web::Data<Arc<RedirectLoopManager>>,
) -> HttpResponse {
    let content_id = id.into_inner();
    let links = match load_links(&catalog, content_id, query.episode_id).await {
        Ok(links) => links,
        Err(resp) => return resp,
    };

    let Some(link) = links.iter().find(|l| l.id == body.link_id) else {
        return error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::SourceNotFound,
            &format!("Download link {} not found", body.link_id),
        );
    };
    let url = match body.mirror_id {
        None => link.url.as_str(),
        Some(mirror_id) => match link.mirrors.iter().find(|m| m.id == mirror_id) {
            Some(mirror) => mirror.url.as_str(),
            None => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    ErrorCode::SourceNotFound,
                    &format!("Mirror {} not found", mirror_id),
                );
            }
        },
    };

    let source = GateSource {
        quality: &link.quality,
        source_type: link.source_type,
        url,
    };
    let key = gate_key(content_id, query.episode_id);
    let interstitial_path = gates.interstitial_path();
    let action = match gates
        .with_gate(&session, &key, |gate| {
            gate.choose_source(&source, interstitial_path)
        })
        .await
    {
        Ok(action) => action,
        Err(e) => {
            debug!("Source {} rejected for content {}: {}", link.id, content_id, e);
            return error_from_mflix(&MflixError::from(e), ErrorScope::Gate);
        }
    };

    let response = match action {
        GateAction::OpenExternal { url } => {
            let current = req
                .headers()
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| validate_navigation_target(v).is_ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("/content/{}", content_id));
            match redirects
                .handle_redirect(&session, DOWNLOAD_CTA_POSITION, Some(&url), &current)
                .await
            {
                Some(ad_url) => SourceResponse {
                    action: GateAction::OpenExternal {
                        url: with_return_marker(&ad_url, DOWNLOAD_CTA_POSITION),
                    },
                    redirected: true,
                },
                None => SourceResponse {
                    action: GateAction::OpenExternal { url },
                    redirected: false,
                },
            }
        }
        action @ GateAction::Interstitial { .. } => SourceResponse {
            action,
            redirected: false,
        },
    };

    info!(
        "Session {} chose source {} of content {} (redirected: {})",
        session.id(),
        link.id,
        content_id,
        response.redirected
    );
    success_response(response)
}

pub fn gate_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/content/{id}/gate", web::get().to(get_gate))
        .route("/content/{id}/gate/quality", web::post().to(select_quality))
        .route("/content/{id}/gate/back", web::post().to(back_to_quality))
        .route("/content/{id}/gate/source", web::post().to(choose_source));
}
