//! Admin API 集成测试
//!
//! 覆盖认证、内容 / 剧集 CRUD、广告校验、参考数据、设置与统计。

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use actix_web::App;
use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};
use tempfile::TempDir;

use mflix::api::constants::ACCESS_COOKIE_NAME;
use mflix::api::middleware::SessionMiddleware;
use mflix::api::services::AppStartTime;
use mflix::config::{StaticConfig, get_config, set_config};
use mflix::runtime::lifetime::startup::StartupContext;
use mflix::runtime::modes::server::configure_services;
use mflix::services::SystemClock;
use mflix::storage::SeaOrmStorage;
use mflix::utils::password::hash_password;

// =============================================================================
// 测试环境初始化
// =============================================================================

const ADMIN_PASSWORD: &str = "correct-horse-battery";

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        let mut config = StaticConfig::default();
        config.api.admin_password = hash_password(ADMIN_PASSWORD).expect("哈希密码失败");
        config.api.jwt_secret = "admin-api-test-secret-0123456789abcdef".to_string();
        config.gate.max_redirect_links_per_position = 2;
        set_config(config);
    });
}

async fn temp_storage() -> (TempDir, Arc<SeaOrmStorage>) {
    init_static_config();
    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("admin_api_test.db").display()
    );
    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("创建存储失败");
    (temp_dir, Arc::new(storage))
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

macro_rules! test_app {
    ($storage:expr) => {{
        let ctx = StartupContext::build($storage.clone(), Arc::new(SystemClock));
        let start = AppStartTime {
            start_datetime: chrono::Utc::now(),
        };
        test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(
                    ctx.sessions.clone(),
                    &get_config().session,
                ))
                .configure(|cfg| configure_services(cfg, &ctx, &start)),
        )
        .await
    }};
}

macro_rules! login {
    ($app:expr) => {{
        let req = TestRequest::post()
            .uri("/admin/v1/auth/login")
            .peer_addr(peer())
            .set_json(json!({"password": ADMIN_PASSWORD}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", body["data"]["access_token"].as_str().unwrap())
    }};
}

fn movie(title: &str) -> Value {
    json!({
        "title": title,
        "content_type": "movie",
        "release_year": 2010,
        "rating": 8.8,
        "genre": "Sci-Fi",
        "country": "USA",
        "download_links": [
            {
                "quality": "720p",
                "source_type": "direct",
                "url": "https://cdn.example.com/inception-720p.mkv"
            },
            {
                "quality": "1080p",
                "source_type": "free",
                "url": "https://cdn.example.com/inception-1080p.mkv",
                "file_size": "2.4 GB",
                "mirrors": [
                    {"name": "Mirror A", "url": "https://mirror.example.com/inception-1080p.mkv"}
                ]
            }
        ],
        "trailer": {"title": "Official Trailer", "url": "https://video.example.com/inception"}
    })
}

// =============================================================================
// 认证
// =============================================================================

#[actix_rt::test]
async fn test_login_and_token_checks() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);

    // 未认证
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/admin/v1/contents").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1001);

    // 错误密码
    let req = TestRequest::post()
        .uri("/admin/v1/auth/login")
        .peer_addr(peer())
        .set_json(json!({"password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2000);

    // 正确密码：token 同时出现在响应体和 cookie 中
    let req = TestRequest::post()
        .uri("/admin/v1/auth/login")
        .peer_addr(peer())
        .set_json(json!({"password": ADMIN_PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == ACCESS_COOKIE_NAME)
        .map(|c| c.into_owned())
        .expect("access cookie not set");
    assert!(cookie.http_only().unwrap_or(false));
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(token, cookie.value());
    assert_eq!(body["data"]["expires_in"], 3600);

    let req = TestRequest::get()
        .uri("/admin/v1/auth/verify")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get()
        .uri("/admin/v1/auth/verify")
        .cookie(cookie)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get()
        .uri("/admin/v1/auth/verify")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_login_is_rate_limited() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);

    let mut limited = false;
    for _ in 0..10 {
        let req = TestRequest::post()
            .uri("/admin/v1/auth/login")
            .peer_addr("10.0.0.9:5555".parse().unwrap())
            .set_json(json!({"password": "wrong"}))
            .to_request();
        if test::call_service(&app, req).await.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
    }
    assert!(limited);
}

// =============================================================================
// 内容
// =============================================================================

#[actix_rt::test]
async fn test_content_crud() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);
    let auth = login!(app);

    let req = TestRequest::post()
        .uri("/admin/v1/contents")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(movie("Inception"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["title"], "Inception");

    // 详情：按清晰度分组，1080p 在前
    let req = TestRequest::get()
        .uri(&format!("/admin/v1/contents/{}", id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let downloads = body["data"]["downloads"].as_array().unwrap();
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0]["quality"], "1080p");
    assert_eq!(downloads[0]["links"][0]["mirrors"][0]["name"], "Mirror A");
    assert_eq!(body["data"]["trailer"]["title"], "Official Trailer");

    // 更新：trailer 设为 null 删除，download_links 缺省则保留
    let req = TestRequest::put()
        .uri(&format!("/admin/v1/contents/{}", id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({
            "title": "Inception (2010)",
            "content_type": "movie",
            "is_featured": true,
            "trailer": null
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["title"], "Inception (2010)");
    assert_eq!(body["data"]["is_featured"], true);

    let req = TestRequest::get()
        .uri(&format!("/api/content/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["trailer"].is_null());
    assert_eq!(body["data"]["downloads"].as_array().unwrap().len(), 2);

    // 删除
    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/contents/{}", id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["deleted"], true);

    let req = TestRequest::get()
        .uri(&format!("/admin/v1/contents/{}", id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3000);

    assert!(storage.get_download_links(id as i32).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_invalid_content_writes_nothing() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);
    let auth = login!(app);

    let mut bad_link = movie("Broken");
    bad_link["download_links"][1]["url"] = json!("ftp://cdn.example.com/x.mkv");

    for payload in [
        json!({"title": "  ", "content_type": "movie"}),
        json!({"title": "Bad rating", "content_type": "movie", "rating": 11.5}),
        bad_link,
    ] {
        let req = TestRequest::post()
            .uri("/admin/v1/contents")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 3001);
    }

    let req = TestRequest::get()
        .uri("/admin/v1/contents")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn test_episode_crud() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);
    let auth = login!(app);

    let req = TestRequest::post()
        .uri("/admin/v1/contents")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({"title": "Dark", "content_type": "series"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let content_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::post()
        .uri(&format!("/admin/v1/contents/{}/episodes", content_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({
            "season_number": 1,
            "episode_number": 1,
            "title": "Secrets",
            "download_links": [
                {"quality": "1080p", "url": "https://cdn.example.com/dark-s01e01.mkv"}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let episode_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::get()
        .uri(&format!("/admin/v1/contents/{}/episodes", content_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // 公开详情：剧集下挂自己的下载链接
    let req = TestRequest::get()
        .uri(&format!("/api/content/{}", content_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["downloads"], json!([]));
    assert_eq!(
        body["data"]["episodes"][0]["downloads"][0]["quality"],
        "1080p"
    );

    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/episodes/{}", episode_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/episodes/{}", episode_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3002);

    // 不存在的内容
    let req = TestRequest::get()
        .uri("/admin/v1/contents/9999/episodes")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// 广告
// =============================================================================

fn redirect_ad(position: &str, active: bool) -> Value {
    json!({
        "name": "Sponsor",
        "ad_type": "redirect_link",
        "position": position,
        "redirect_url": "https://ads.example.com/sponsor",
        "is_active": active
    })
}

#[actix_rt::test]
async fn test_redirect_link_validation_and_capacity() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);
    let auth = login!(app);

    let req = TestRequest::post()
        .uri("/admin/v1/ads")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({
            "name": "No target",
            "ad_type": "redirect_link",
            "position": "page_switch"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 5001);

    for _ in 0..2 {
        let req = TestRequest::post()
            .uri("/admin/v1/ads")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .set_json(redirect_ad("page_switch", true))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }

    // 超出每个位置的上限
    let req = TestRequest::post()
        .uri("/admin/v1/ads")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(redirect_ad("page_switch", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 5002);

    // 未启用的不占名额，其它位置也不受影响
    let req = TestRequest::post()
        .uri("/admin/v1/ads")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(redirect_ad("page_switch", false))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let inactive_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::post()
        .uri("/admin/v1/ads")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(redirect_ad("download_cta_1", true))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    // 启用它会超限
    let req = TestRequest::put()
        .uri(&format!("/admin/v1/ads/{}", inactive_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(redirect_ad("page_switch", true))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = TestRequest::get()
        .uri("/admin/v1/ads")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/ads/{}", inactive_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get()
        .uri("/admin/v1/stats")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["ads_total"], 3);
    assert_eq!(body["data"]["redirect_links"], 3);
}

// =============================================================================
// 参考数据与设置
// =============================================================================

#[actix_rt::test]
async fn test_reference_data_and_settings() {
    let (_dir, storage) = temp_storage().await;
    let app = test_app!(storage);
    let auth = login!(app);

    let req = TestRequest::post()
        .uri("/admin/v1/genres")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({"name": "Drama"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let genre_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::post()
        .uri("/admin/v1/genres")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({"name": "Drama"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3003);

    let req = TestRequest::post()
        .uri("/admin/v1/countries")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_json(json!({"name": "Japan", "code": "JP"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/api/genres").to_request())
            .await;
    assert_eq!(body["data"][0]["name"], "Drama");
    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/countries").to_request(),
    )
    .await;
    assert_eq!(body["data"][0]["code"], "JP");

    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/genres/{}", genre_id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // 设置
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/settings/site_name").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::put()
        .uri("/admin/v1/settings/site_name")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({"title": "MFlix", "tagline": "Watch more"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/settings/site_name").to_request(),
    )
    .await;
    assert_eq!(body["data"]["title"], "MFlix");
}
