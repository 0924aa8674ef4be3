//! 公开目录接口 `/api`

use actix_web::{Responder, Result as ActixResult, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::trace;

use crate::services::CatalogService;

use super::admin::{ContentListQuery, ErrorScope, api_result, api_result_in, success_response};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AdsQuery {
    pub position: String,
}

pub async fn list_content(
    query: web::Query<ContentListQuery>,
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    trace!("Catalog: list content {:?}", query);
    let result = catalog
        .list_content(&query.filter(), query.page, query.page_size)
        .await;
    Ok(api_result_in(result, ErrorScope::Content))
}

pub async fn get_content(
    id: web::Path<i32>,
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result_in(
        catalog.get_content_detail(id.into_inner()).await,
        ErrorScope::Content,
    ))
}

/// 空查询返回空列表
pub async fn search(
    query: web::Query<SearchQuery>,
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    trace!("Catalog: search '{}'", query.q);
    Ok(success_response(catalog.search(&query.q, query.limit).await))
}

pub async fn list_ads(
    query: web::Query<AdsQuery>,
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    Ok(success_response(catalog.list_ads(&query.position).await))
}

pub async fn list_genres(catalog: web::Data<Arc<CatalogService>>) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.list_genres().await))
}

pub async fn list_countries(
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.list_countries().await))
}

pub async fn get_setting(
    key: web::Path<String>,
    catalog: web::Data<Arc<CatalogService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.get_setting(&key).await))
}

pub fn catalog_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/content", web::get().to(list_content))
        .route("/content/{id}", web::get().to(get_content))
        .route("/search", web::get().to(search))
        .route("/ads", web::get().to(list_ads))
        .route("/genres", web::get().to(list_genres))
        .route("/countries", web::get().to(list_countries))
        .route("/settings/{key}", web::get().to(get_setting));
}
