//! Visitor session middleware
//!
//! Resolves the session cookie to a [`SessionContext`] in request
//! extensions. Missing or malformed cookies get a fresh id, sent back as
//! `Set-Cookie` on the response.

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::config::SessionConfig;
use crate::session::{SessionContext, SessionId, SessionStore};

#[derive(Clone)]
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    cookie_secure: bool,
    max_age_secs: i64,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
            max_age_secs: config.idle_ttl_secs as i64,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionService {
            service: Rc::new(service),
            config: Rc::new(self.clone()),
        }))
    }
}

pub struct SessionService<S> {
    service: Rc<S>,
    config: Rc<SessionMiddleware>,
}

impl<S, B> Service<ServiceRequest> for SessionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
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
        let config = self.config.clone();

        let existing = req
            .cookie(&config.cookie_name)
            .and_then(|c| SessionId::parse(c.value()));
        let is_new = existing.is_none();
        let id = existing.unwrap_or_else(SessionId::generate);
        if is_new {
            trace!("Starting new visitor session {}", id);
        }

        req.extensions_mut()
            .insert(SessionContext::new(config.store.clone(), id.clone()));

        Box::pin(async move {
            let mut response = srv.call(req).await?;

            if is_new {
                let cookie = Cookie::build(config.cookie_name.clone(), id.to_string())
                    .path("/")
                    .http_only(true)
                    .secure(config.cookie_secure)
                    .same_site(SameSite::Lax)
                    .max_age(CookieDuration::seconds(config.max_age_secs))
                    .finish();
                if let Err(e) = response.response_mut().add_cookie(&cookie) {
                    warn!("Failed to set session cookie: {}", e);
                }
            }

            Ok(response)
        })
    }
}
