//! Admin API 广告 / 跳转链接 CRUD

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::services::AdminService;
use crate::storage::NewAd;

use super::error_code::ErrorScope;
use super::helpers::{api_result_in, created_response, error_from_mflix};
use super::types::DeleteResponse;

pub async fn list_ads(admin: web::Data<Arc<AdminService>>) -> ActixResult<impl Responder> {
    Ok(api_result_in(admin.list_ads().await, ErrorScope::Ads))
}

pub async fn create_ad(
    body: web::Json<NewAd>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    info!(
        "Admin API: create {} ad '{}' at '{}'",
        body.ad_type, body.name, body.position
    );
    Ok(match admin.create_ad(&body).await {
        Ok(ad) => created_response(ad),
        Err(e) => error_from_mflix(&e, ErrorScope::Ads),
    })
}

pub async fn update_ad(
    id: web::Path<i32>,
    body: web::Json<NewAd>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    info!("Admin API: update ad {}", id);
    Ok(api_result_in(admin.update_ad(id, &body).await, ErrorScope::Ads))
}

pub async fn delete_ad(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    info!("Admin API: delete ad {}", id);
    let result = admin
        .delete_ad(id)
        .await
        .map(|_| DeleteResponse { id, deleted: true });
    Ok(api_result_in(result, ErrorScope::Ads))
}
