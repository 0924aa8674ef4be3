//! Admin API 参考数据（类型 / 国家）、站点设置与统计

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::services::AdminService;

use super::error_code::ErrorScope;
use super::helpers::{api_result, api_result_in, created_response, error_from_mflix};
use super::types::{CountryRequest, DeleteResponse, GenreRequest};

pub async fn list_genres(admin: web::Data<Arc<AdminService>>) -> ActixResult<impl Responder> {
    Ok(api_result(admin.list_genres().await))
}

pub async fn create_genre(
    body: web::Json<GenreRequest>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(match admin.create_genre(&body.name).await {
        Ok(genre) => created_response(genre),
        Err(e) => error_from_mflix(&e, ErrorScope::Reference),
    })
}

pub async fn delete_genre(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    let result = admin
        .delete_genre(id)
        .await
        .map(|_| DeleteResponse { id, deleted: true });
    Ok(api_result_in(result, ErrorScope::Reference))
}

pub async fn list_countries(admin: web::Data<Arc<AdminService>>) -> ActixResult<impl Responder> {
    Ok(api_result(admin.list_countries().await))
}

pub async fn create_country(
    body: web::Json<CountryRequest>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(
        match admin
            .create_country(&body.name, body.code.as_deref())
            .await
        {
            Ok(country) => created_response(country),
            Err(e) => error_from_mflix(&e, ErrorScope::Reference),
        },
    )
}

pub async fn delete_country(
    id: web::Path<i32>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    let result = admin
        .delete_country(id)
        .await
        .map(|_| DeleteResponse { id, deleted: true });
    Ok(api_result_in(result, ErrorScope::Reference))
}

/// PUT /settings/{key}，请求体为任意 JSON
pub async fn put_setting(
    key: web::Path<String>,
    body: web::Json<serde_json::Value>,
    admin: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let key = key.into_inner();
    info!("Admin API: put setting '{}'", key);
    let value = body.into_inner();
    let result = admin.put_setting(&key, &value).await.map(|_| value);
    Ok(api_result(result))
}

pub async fn get_stats(admin: web::Data<Arc<AdminService>>) -> ActixResult<impl Responder> {
    Ok(api_result(admin.stats().await))
}
