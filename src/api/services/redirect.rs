//! `GET /go/{position}?to=<url>` 广告跳转入口

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::services::RedirectLoopManager;
use crate::services::redirect_loop::with_return_marker;
use crate::session::SessionContext;
use crate::utils::url_validator::{validate_navigation_target, validation_error_message};

use super::admin::{ErrorCode, error_response};

#[derive(Debug, Deserialize)]
pub struct GoQuery {
    pub to: Option<String>,
}

/// Page the click came from; falls back to the destination itself
///
/// The Referer is client-controlled, so it must pass the same check as `to`
/// before it can be stashed as a return target.
fn current_url<'a>(req: &'a HttpRequest, to: &'a str) -> &'a str {
    req.headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| validate_navigation_target(v).is_ok())
        .unwrap_or(to)
}

fn temporary_redirect(location: &str) -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, location))
        .insert_header((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .finish()
}

pub async fn go(
    req: HttpRequest,
    position: web::Path<String>,
    query: web::Query<GoQuery>,
    session: SessionContext,
    manager: web::Data<Arc<RedirectLoopManager>>,
) -> HttpResponse {
    let position = position.into_inner();

    let to = match query.to.as_deref() {
        Some(to) => to,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidRedirectTarget,
                "Missing 'to' parameter",
            );
        }
    };
    if let Err(e) = validate_navigation_target(to) {
        trace!("Rejected navigation target '{}': {:?}", to, e);
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRedirectTarget,
            validation_error_message(&e),
        );
    }

    let current = current_url(&req, to);
    match manager
        .handle_redirect(&session, &position, Some(to), current)
        .await
    {
        Some(link) => temporary_redirect(&with_return_marker(&link, &position)),
        None => {
            debug!("No redirect at '{}', continuing to {}", position, to);
            temporary_redirect(to)
        }
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("/go").route("/{position}", web::get().to(go))
}
