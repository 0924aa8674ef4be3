pub mod admin;
pub mod catalog;
pub mod gate;
pub mod health;
pub mod interstitial;
pub mod quiz;
pub mod redirect;

use actix_web::web;

pub use health::{AppStartTime, HealthService, health_routes};
pub use interstitial::interstitial;
pub use redirect::redirect_routes;

/// 公开 JSON 接口 `/api`
///
/// 目录、下载门与问答门共用一个 scope。
pub fn public_api_routes() -> actix_web::Scope {
    web::scope("/api")
        .configure(gate::gate_routes)
        .configure(catalog::catalog_routes)
        .configure(quiz::quiz_routes)
}
