//! 广告插页 `GET /ads/interstitial?next=<url>`
//!
//! Browsers asking for HTML get a small page; everything else gets JSON.

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::api::constants::INTERSTITIAL_AD_POSITION;
use crate::services::CatalogService;
use crate::storage::{Ad, AdType};
use crate::utils::url_validator::{validate_navigation_target, validation_error_message};

use super::admin::{ErrorCode, error_response, success_response};

#[derive(Debug, Deserialize)]
pub struct InterstitialQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InterstitialView {
    pub ads: Vec<Ad>,
    pub continue_url: String,
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn wants_html(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn render_ad(ad: &Ad) -> String {
    match (ad.ad_type, &ad.html_code, &ad.image_url) {
        // html_code 由管理员录入，原样输出
        (_, Some(html), _) if !html.is_empty() => html.clone(),
        (AdType::Banner | AdType::Popup | AdType::Native, _, Some(image)) => {
            let img = format!(
                r#"<img src="{}" alt="{}">"#,
                escape_html(image),
                escape_html(&ad.name)
            );
            match &ad.redirect_url {
                Some(href) => format!(
                    r#"<a href="{}" rel="nofollow noopener" target="_blank">{}</a>"#,
                    escape_html(href),
                    img
                ),
                None => img,
            }
        }
        _ => String::new(),
    }
}

pub fn render_page(view: &InterstitialView) -> String {
    let ads: String = view
        .ads
        .iter()
        .map(|ad| format!(r#"<div class="ad">{}</div>"#, render_ad(ad)))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><meta name="robots" content="noindex"><title>MFlix</title></head>
<body>
<main>
{}
<p><a class="continue" href="{}">Continue to download</a></p>
</main>
</body>
</html>
"#,
        ads,
        escape_html(&view.continue_url)
    )
}

pub async fn interstitial(
    req: HttpRequest,
    query: web::Query<InterstitialQuery>,
    catalog: web::Data<Arc<CatalogService>>,
) -> HttpResponse {
    let Some(next) = query.next.as_deref() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRedirectTarget,
            "Missing 'next' parameter",
        );
    };
    if let Err(e) = validate_navigation_target(next) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRedirectTarget,
            validation_error_message(&e),
        );
    }

    let view = InterstitialView {
        ads: catalog.list_ads(INTERSTITIAL_AD_POSITION).await,
        continue_url: next.to_string(),
    };
    trace!("Interstitial with {} ads before {}", view.ads.len(), next);

    if wants_html(&req) {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .body(render_page(&view))
    } else {
        success_response(view)
    }
}
