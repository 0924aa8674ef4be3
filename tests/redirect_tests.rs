//! Redirect loop tests
//!
//! One redirect per bucket per position per session, and the way back
//! through the return marker.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, HttpResponse, web};
use async_trait::async_trait;

use mflix::api::middleware::{ReturnTracker, SessionMiddleware};
use mflix::api::services::redirect::redirect_routes;
use mflix::config::SessionConfig;
use mflix::errors::{MflixError, Result};
use mflix::services::redirect_loop::{redirect_from_key, with_return_marker};
use mflix::services::{Clock, RedirectLinkSource, RedirectLoopManager};
use mflix::session::{MemorySessionStore, SessionContext, SessionId, SessionStore};
use mflix::storage::RedirectLink;

// =============================================================================
// Test Setup
// =============================================================================

/// Manually driven clock
struct FakeClock(AtomicI64);

impl FakeClock {
    fn at(ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(ms)))
    }

    fn advance_secs(&self, secs: i64) {
        self.0.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed set of redirect links, optionally failing
struct FakeLinks {
    links: Vec<RedirectLink>,
    fail: bool,
}

impl FakeLinks {
    fn with(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            links: urls
                .iter()
                .enumerate()
                .map(|(i, url)| RedirectLink {
                    id: i as i32 + 1,
                    position: String::new(),
                    redirect_url: url.to_string(),
                    is_active: true,
                    display_order: i as i32,
                })
                .collect(),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            links: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl RedirectLinkSource for FakeLinks {
    async fn fetch_redirect_links(&self, position: &str) -> Result<Vec<RedirectLink>> {
        if self.fail {
            return Err(MflixError::database_connection("db down"));
        }
        Ok(self
            .links
            .iter()
            .cloned()
            .map(|mut l| {
                l.position = position.to_string();
                l
            })
            .collect())
    }
}

// 起始时间对齐到桶边界，避免测试跨桶
const T0: i64 = 1_700_000_000_000;

fn manager(links: Arc<FakeLinks>, clock: Arc<FakeClock>) -> Arc<RedirectLoopManager> {
    Arc::new(RedirectLoopManager::new(
        links,
        clock,
        &SessionConfig::default(),
    ))
}

fn session(store: &Arc<dyn SessionStore>) -> SessionContext {
    SessionContext::new(store.clone(), SessionId::generate())
}

fn store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::from_config(&SessionConfig::default()))
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Cookie<'static> {
    let name = SessionConfig::default().cookie_name;
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
        .expect("session cookie not set")
}

async fn page() -> HttpResponse {
    HttpResponse::Ok().body("page")
}

macro_rules! test_app {
    ($manager:expr, $store:expr) => {
        test::init_service(
            App::new()
                .wrap(ReturnTracker::new($manager.clone()))
                .wrap(SessionMiddleware::new($store.clone(), &SessionConfig::default()))
                .app_data(web::Data::new($manager.clone()))
                .service(redirect_routes())
                .route("/content/{id}", web::get().to(page)),
        )
        .await
    };
}

// =============================================================================
// Manager
// =============================================================================

#[tokio::test]
async fn test_no_links_means_no_redirect() {
    let store = store();
    let session = session(&store);
    let mgr = manager(FakeLinks::with(&[]), FakeClock::at(T0));

    let out = mgr
        .handle_redirect(&session, "page_switch", Some("/content/2"), "/content/1")
        .await;
    assert_eq!(out, None);
    // 没有跳转时不写入任何暂存
    assert!(
        mgr.handle_back_navigation(&session, "/content/1?from_redirect=page_switch")
            .await
            .unwrap()
            .target
            .is_none()
    );
}

#[tokio::test]
async fn test_lookup_failure_fails_open() {
    let store = store();
    let session = session(&store);
    let mgr = manager(FakeLinks::failing(), FakeClock::at(T0));

    assert!(mgr.get_redirect_links("page_switch").await.is_empty());
    assert_eq!(
        mgr.handle_redirect(&session, "page_switch", None, "/").await,
        None
    );
}

#[tokio::test]
async fn test_one_redirect_per_bucket() {
    let store = store();
    let session = session(&store);
    let clock = FakeClock::at(T0);
    let mgr = manager(
        FakeLinks::with(&["https://ads.example.com/a", "https://ads.example.com/b"]),
        clock.clone(),
    );

    let first = mgr
        .handle_redirect(&session, "page_switch", None, "/content/1")
        .await;
    let first = first.expect("first click should redirect");
    assert!(first.starts_with("https://ads.example.com/"));

    clock.advance_secs(3);
    assert_eq!(
        mgr.handle_redirect(&session, "page_switch", None, "/content/1")
            .await,
        None
    );

    // 其它位置互不影响
    assert!(
        mgr.handle_redirect(&session, "download_cta_1", None, "/content/1")
            .await
            .is_some()
    );

    // 其它会话互不影响
    let other = SessionContext::new(store.clone(), SessionId::generate());
    assert!(
        mgr.handle_redirect(&other, "page_switch", None, "/content/1")
            .await
            .is_some()
    );

    // 下一个桶再次允许
    clock.advance_secs(10);
    assert!(
        mgr.handle_redirect(&session, "page_switch", None, "/content/1")
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_round_trip_recovers_original_url() {
    let store = store();
    let session = session(&store);
    let mgr = manager(
        FakeLinks::with(&["https://ads.example.com/a"]),
        FakeClock::at(T0),
    );

    let target = mgr
        .handle_redirect(
            &session,
            "download_cta_1",
            Some("https://cdn.example.com/movie.mkv"),
            "/content/7",
        )
        .await
        .unwrap();
    assert_eq!(target, "https://ads.example.com/a");

    let back = mgr
        .handle_back_navigation(&session, &with_return_marker("/content/7", "download_cta_1"))
        .await
        .unwrap();
    assert_eq!(back.position, "download_cta_1");
    assert_eq!(back.cleaned_url, "/content/7");
    assert_eq!(
        back.target.as_deref(),
        Some("https://cdn.example.com/movie.mkv")
    );

    // 暂存只能消费一次
    let again = mgr
        .handle_back_navigation(&session, &with_return_marker("/content/7", "download_cta_1"))
        .await
        .unwrap();
    assert!(again.target.is_none());
}

#[tokio::test]
async fn test_round_trip_without_original_returns_to_initiating_page() {
    let store = store();
    let session = session(&store);
    let mgr = manager(
        FakeLinks::with(&["https://ads.example.com/a"]),
        FakeClock::at(T0),
    );

    mgr.handle_redirect(&session, "page_switch", None, "/content/3")
        .await
        .unwrap();

    let back = mgr
        .handle_back_navigation(&session, "/content/3?tab=info&from_redirect=page_switch")
        .await
        .unwrap();
    assert_eq!(back.cleaned_url, "/content/3?tab=info");
    assert_eq!(back.target.as_deref(), Some("/content/3"));
}

#[tokio::test]
async fn test_unmarked_url_is_not_back_navigation() {
    let store = store();
    let session = session(&store);
    let mgr = manager(FakeLinks::with(&[]), FakeClock::at(T0));
    assert!(
        mgr.handle_back_navigation(&session, "/content/1?page=2")
            .await
            .is_none()
    );
}

// =============================================================================
// HTTP
// =============================================================================

#[actix_rt::test]
async fn test_go_without_links_continues_unchanged() {
    let store = store();
    let mgr = manager(FakeLinks::with(&[]), FakeClock::at(T0));
    let app = test_app!(mgr, store);

    let req = TestRequest::get()
        .uri("/go/page_switch?to=https%3A%2F%2Fexample.com%2Fnext%3Fa%3D1")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://example.com/next?a=1");
}

#[actix_rt::test]
async fn test_go_rejects_bad_targets() {
    let store = store();
    let mgr = manager(FakeLinks::with(&[]), FakeClock::at(T0));
    let app = test_app!(mgr, store);

    for uri in [
        "/go/page_switch",
        "/go/page_switch?to=javascript%3Aalert(1)",
        "/go/page_switch?to=%2F%2Fevil.example.com",
    ] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_go_redirects_once_then_returns() {
    let store = store();
    let clock = FakeClock::at(T0);
    let mgr = manager(FakeLinks::with(&["https://ads.example.com/a"]), clock.clone());
    let app = test_app!(mgr, store);

    let req = TestRequest::get()
        .uri("/go/page_switch?to=%2Fcontent%2F2")
        .insert_header((header::REFERER, "/content/1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp),
        "https://ads.example.com/a?from_redirect=page_switch"
    );
    let cookie = session_cookie(&resp);

    // 同一桶内第二次点击直接前往目标
    let req = TestRequest::get()
        .uri("/go/page_switch?to=%2Fcontent%2F2")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/content/2");

    // 带标记回到站内，被送往原目标
    let req = TestRequest::get()
        .uri("/content/1?from_redirect=page_switch")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/content/2");

    // 暂存已消费，标记被去掉后再跳回本页
    let req = TestRequest::get()
        .uri("/content/1?from_redirect=page_switch")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/content/1");

    let req = TestRequest::get()
        .uri("/content/1")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_go_ignores_unsafe_referer() {
    let store = store();
    let mgr = manager(FakeLinks::with(&["https://ads.example.com/a"]), FakeClock::at(T0));
    let app = test_app!(mgr, store);

    for referer in ["javascript:alert(1)", "//evil.example.com/x"] {
        let req = TestRequest::get()
            .uri("/go/page_switch?to=%2Fcontent%2F2")
            .insert_header((header::REFERER, referer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        let cookie = session_cookie(&resp);

        // 不可信的 Referer 不会被暂存，回退为目标地址
        let from = store
            .get(cookie.value(), &redirect_from_key("page_switch"))
            .await;
        assert_eq!(from.as_deref(), Some("/content/2"), "{}", referer);
    }
}

#[actix_rt::test]
async fn test_sessions_are_isolated() {
    let store = store();
    let mgr = manager(FakeLinks::with(&["https://ads.example.com/a"]), FakeClock::at(T0));
    let app = test_app!(mgr, store);

    for _ in 0..2 {
        // 无 cookie，每次都是新会话
        let req = TestRequest::get()
            .uri("/go/page_switch?to=%2Fcontent%2F2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(location(&resp).starts_with("https://ads.example.com/a"));
    }
}
