//! Admin API 内容 / 剧集 CRUD

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::AdminService;

use super::error_code::ErrorScope;
use super::helpers::{api_result_in, created_response, error_from_mflix};
use super::types::{
    ContentListQuery, CreateContentRequest, CreateEpisodeRequest, DeleteResponse,
    UpdateContentRequest,
};

pub async fn list_contents(
    query: web::Query<ContentListQuery>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: list contents {:?}", query);
    let result = admin
        .list_contents(&query.filter(), query.page, query.page_size)
        .await;
    Ok(api_result_in(result, ErrorScope::Content))
}

pub async fn get_content(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result_in(
        admin.get_content(id.into_inner()).await,
        ErrorScope::Content,
    ))
}

pub async fn create_content(
    body: web::Json<CreateContentRequest>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let req = body.into_inner();
    info!(
        "Admin API: create content '{}' with {} download links",
        req.content.title,
        req.download_links.len()
    );

    Ok(
        match admin
            .create_content(&req.content, &req.download_links, req.trailer.as_ref())
            .await
        {
            Ok(content) => created_response(content),
            Err(e) => error_from_mflix(&e, ErrorScope::Content),
        },
    )
}

pub async fn update_content(
    id: web::Path<i32>,
    body: web::Json<UpdateContentRequest>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    let req = body.into_inner();
    info!("Admin API: update content {}", id);

    let result = admin
        .update_content(
            id,
            &req.content,
            req.download_links.as_deref(),
            req.trailer.as_ref().map(Option::as_ref),
        )
        .await;
    Ok(api_result_in(result, ErrorScope::Content))
}

pub async fn delete_content(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    info!("Admin API: delete content {}", id);
    let result = admin
        .delete_content(id)
        .await
        .map(|_| DeleteResponse { id, deleted: true });
    Ok(api_result_in(result, ErrorScope::Content))
}

pub async fn list_episodes(
    content_id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result_in(
        admin.list_episodes(content_id.into_inner()).await,
        ErrorScope::Content,
    ))
}

pub async fn create_episode(
    content_id: web::Path<i32>,
    body: web::Json<CreateEpisodeRequest>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let content_id = content_id.into_inner();
    let req = body.into_inner();
    info!(
        "Admin API: create episode S{}E{} for content {}",
        req.episode.season_number, req.episode.episode_number, content_id
    );

    Ok(
        match admin
            .create_episode(content_id, &req.episode, &req.download_links)
            .await
        {
            Ok(episode) => created_response(episode),
            Err(e) => error_from_mflix(&e, ErrorScope::Content),
        },
    )
}

pub async fn delete_episode(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    info!("Admin API: delete episode {}", id);
    let result = admin
        .delete_episode(id)
        .await
        .map(|_| DeleteResponse { id, deleted: true });
    Ok(api_result_in(result, ErrorScope::Episode))
}
