//! Admin API 路由配置
//!
//! 将 /v1 下的路由按功能模块拆分。

use actix_web::web;

use super::ads_crud::{create_ad, delete_ad, list_ads, update_ad};
use super::auth::{login, login_rate_limiter, logout, verify_token};
use super::bulk_upload::import_contents;
use super::content_crud::{
    create_content, create_episode, delete_content, delete_episode, get_content, list_contents,
    list_episodes, update_content,
};
use super::reference::{
    create_country, create_genre, delete_country, delete_genre, get_stats, list_countries,
    list_genres, put_setting,
};

/// 认证路由 `/auth`
///
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/logout - 登出
/// - GET /auth/verify - 验证 token
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/logout", web::post().to(logout))
        .route("/verify", web::get().to(verify_token))
}

/// 内容路由 `/contents`
pub fn contents_routes() -> actix_web::Scope {
    web::scope("/contents")
        .route("", web::get().to(list_contents))
        .route("", web::post().to(create_content))
        // must be before /{id}
        .route("/import", web::post().to(import_contents))
        .route("/{id}/episodes", web::get().to(list_episodes))
        .route("/{id}/episodes", web::post().to(create_episode))
        .route("/{id}", web::get().to(get_content))
        .route("/{id}", web::put().to(update_content))
        .route("/{id}", web::delete().to(delete_content))
}

pub fn episodes_routes() -> actix_web::Scope {
    web::scope("/episodes").route("/{id}", web::delete().to(delete_episode))
}

/// 广告路由 `/ads`，包括 redirect_link 类型
pub fn ads_routes() -> actix_web::Scope {
    web::scope("/ads")
        .route("", web::get().to(list_ads))
        .route("", web::post().to(create_ad))
        .route("/{id}", web::put().to(update_ad))
        .route("/{id}", web::delete().to(delete_ad))
}

/// 类型、国家、设置与统计，直接挂在 /v1 下
pub fn reference_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/genres", web::get().to(list_genres))
        .route("/genres", web::post().to(create_genre))
        .route("/genres/{id}", web::delete().to(delete_genre))
        .route("/countries", web::get().to(list_countries))
        .route("/countries", web::post().to(create_country))
        .route("/countries/{id}", web::delete().to(delete_country))
        .route("/settings/{key}", web::put().to(put_setting))
        .route("/stats", web::get().to(get_stats))
        .route("/stats", web::head().to(get_stats));
}

/// Admin API v1 路由
///
/// 组合所有子模块路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(auth_routes())
        .service(contents_routes())
        .service(episodes_routes())
        .service(ads_routes())
        .configure(reference_routes)
}
