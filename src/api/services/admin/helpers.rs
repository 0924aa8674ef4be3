//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::api::constants;
use crate::errors::MflixError;

use super::error_code::{ErrorCode, ErrorScope};
use super::types::ApiResponse;

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// MflixError → HTTP 状态码 + ErrorCode
pub fn error_from_mflix(err: &MflixError, scope: ErrorScope) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("API error: {}", err);
    }
    error_response(status, ErrorCode::for_error(err, scope), err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<MflixError>,
{
    api_result_in(result, ErrorScope::Generic)
}

pub fn api_result_in<T, E>(result: Result<T, E>, scope: ErrorScope) -> HttpResponse
where
    T: Serialize,
    E: Into<MflixError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_mflix(&e.into(), scope),
    }
}

/// Admin access cookie
pub struct CookieBuilder {
    secure: bool,
    access_token_minutes: u64,
}

impl CookieBuilder {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        Self {
            secure: config.session.cookie_secure,
            access_token_minutes: config.api.access_token_minutes,
        }
    }

    fn build_cookie(&self, value: String, max_age: CookieDuration) -> Cookie<'static> {
        let mut cookie = Cookie::new(constants::ACCESS_COOKIE_NAME.to_string(), value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(max_age);
        cookie
    }

    pub fn build_access_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie(
            token,
            CookieDuration::minutes(self.access_token_minutes as i64),
        )
    }

    pub fn build_expired_access_cookie(&self) -> Cookie<'static> {
        self.build_cookie(String::new(), CookieDuration::ZERO)
    }

    pub fn access_token_minutes(&self) -> u64 {
        self.access_token_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_mflix_status() {
        let resp = error_from_mflix(&MflixError::not_found("gone"), ErrorScope::Content);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = error_from_mflix(&MflixError::validation("bad"), ErrorScope::Ads);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_from_mflix(&MflixError::database_operation("x"), ErrorScope::Generic);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_result_success() {
        let resp = api_result::<_, MflixError>(Ok(vec![1, 2, 3]));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_expired_cookie() {
        let builder = CookieBuilder {
            secure: true,
            access_token_minutes: 60,
        };
        let cookie = builder.build_expired_access_cookie();
        assert_eq!(cookie.name(), constants::ACCESS_COOKIE_NAME);
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        assert_eq!(cookie.secure(), Some(true));

        let live = builder.build_access_cookie("t".into());
        assert_eq!(live.max_age(), Some(CookieDuration::minutes(60)));
        assert_eq!(live.http_only(), Some(true));
    }
}
