use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants;
use crate::api::jwt::get_jwt_service;
use crate::api::services::admin::{ApiResponse, ErrorCode};
use crate::config::get_config;

/// Paths under the admin prefix reachable without a token
const PUBLIC_AUTH_PATHS: &[&str] = &["/v1/auth/login", "/v1/auth/logout"];

/// Admin authentication middleware
///
/// Accepts a Bearer token first, then the access cookie. The whole admin
/// scope answers 404 while no admin password is configured.
#[derive(Clone)]
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
            admin_prefix: get_config().routes.admin_prefix.clone(),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
    admin_prefix: String,
}

impl<S, B> AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn handle_admin_disabled(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        debug!("Admin password not configured - returning 404");
        req.into_response(
            HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found")
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Admin authentication failed - invalid or missing token");
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()> {
                    code: ErrorCode::Unauthorized as i32,
                    message: "Unauthorized: Invalid or missing token".to_string(),
                    data: None,
                })
                .map_into_right_body(),
        )
    }

    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
    }

    fn validate_token(token: &str, source: &str) -> bool {
        match get_jwt_service().validate_access_token(token) {
            Ok(_claims) => {
                trace!("{} token validation successful", source);
                true
            }
            Err(e) => {
                info!("{} token validation failed: {}", source, e);
                false
            }
        }
    }

    fn is_public_auth_endpoint(req: &ServiceRequest, admin_prefix: &str) -> bool {
        req.path()
            .strip_prefix(admin_prefix)
            .is_some_and(|rest| PUBLIC_AUTH_PATHS.contains(&rest))
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let admin_prefix = self.admin_prefix.clone();

        Box::pin(async move {
            if !get_config().admin_enabled() {
                return Ok(Self::handle_admin_disabled(req));
            }

            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if Self::is_public_auth_endpoint(&req, &admin_prefix) {
                trace!("{} accessed - bypassing authentication", req.path());
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            // 1. Bearer Token
            if let Some(token) = Self::extract_bearer_token(&req)
                && Self::validate_token(&token, "Bearer")
            {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            // 2. Cookie
            if let Some(cookie) = req.cookie(constants::ACCESS_COOKIE_NAME)
                && Self::validate_token(cookie.value(), "Cookie")
            {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            Ok(Self::handle_unauthorized(req))
        })
    }
}
