//! Admin API 认证相关端点

use actix_governor::{Governor, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use tracing::{debug, error, info, warn};

use crate::api::jwt::get_jwt_service;
use crate::config::get_config;
use crate::utils::password::verify_password;

use super::error_code::ErrorCode;
use super::helpers::{CookieBuilder, error_response, json_response, success_response};
use super::types::{AuthSuccessResponse, LoginCredentials, MessageResponse};

/// 登录限流：每秒补充 1 个令牌，突发最多 5 次，按连接 IP 计
pub fn login_rate_limiter() -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .finish()
        .unwrap_or_default();

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 登录：校验管理员密码，签发 access token（响应体 + HttpOnly cookie）
pub async fn login(credentials: web::Json<LoginCredentials>) -> ActixResult<impl Responder> {
    let config = get_config();

    let password_valid = match verify_password(&credentials.password, &config.api.admin_password)
    {
        Ok(valid) => valid,
        Err(e) => {
            error!("Admin API: password verification error: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Authentication error",
            ));
        }
    };

    if !password_valid {
        warn!("Admin API: login failed - wrong password");
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::AuthFailed,
            "Invalid admin password",
        ));
    }

    let access_token = match get_jwt_service().generate_access_token() {
        Ok(token) => token,
        Err(e) => {
            error!("Admin API: failed to generate access token: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Failed to generate token",
            ));
        }
    };

    info!("Admin API: login successful");

    let cookie_builder = CookieBuilder::from_config();
    let mut response = json_response(
        StatusCode::OK,
        ErrorCode::Success,
        "Login successful",
        Some(AuthSuccessResponse {
            access_token: access_token.clone(),
            expires_in: cookie_builder.access_token_minutes() * 60,
        }),
    );
    if let Err(e) = response.add_cookie(&cookie_builder.build_access_cookie(access_token)) {
        warn!("Admin API: failed to set access cookie: {}", e);
    }
    Ok(response)
}

/// 登出：清除 cookie
pub async fn logout() -> ActixResult<impl Responder> {
    info!("Admin API: logout");

    let cookie_builder = CookieBuilder::from_config();
    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_expired_access_cookie())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(super::types::ApiResponse {
            code: ErrorCode::Success as i32,
            message: "Logout successful".to_string(),
            data: Some(MessageResponse {
                message: "Logout successful".to_string(),
            }),
        }))
}

/// 中间件放行即说明 token 有效
pub async fn verify_token() -> ActixResult<impl Responder> {
    Ok(success_response(MessageResponse {
        message: "Token is valid".to_string(),
    }))
}
