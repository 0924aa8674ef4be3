//! Return tracking
//!
//! A visitor coming back from an advertiser lands on a URL carrying
//! `from_redirect=<position>`. If the session stashed a destination for
//! that position the visitor is sent there with a 302; otherwise the 302
//! goes to the same URL with the marker removed.

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::LOCATION},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::services::redirect_loop::{RETURN_MARKER_PARAM, RedirectLoopManager};
use crate::session::SessionContext;

#[derive(Clone)]
pub struct ReturnTracker {
    manager: Arc<RedirectLoopManager>,
}

impl ReturnTracker {
    pub fn new(manager: Arc<RedirectLoopManager>) -> Self {
        Self { manager }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ReturnTracker
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ReturnTrackerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ReturnTrackerMiddleware {
            service: Rc::new(service),
            manager: self.manager.clone(),
        }))
    }
}

pub struct ReturnTrackerMiddleware<S> {
    service: Rc<S>,
    manager: Arc<RedirectLoopManager>,
}

impl<S, B> Service<ServiceRequest> for ReturnTrackerMiddleware<S>
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
        let manager = self.manager.clone();

        Box::pin(async move {
            let navigating = req.method() == Method::GET || req.method() == Method::HEAD;
            let marked = req.query_string().contains(RETURN_MARKER_PARAM);
            let session = req.extensions().get::<SessionContext>().cloned();

            if navigating
                && marked
                && let Some(session) = session
            {
                let current = match req.query_string() {
                    "" => req.path().to_string(),
                    query => format!("{}?{}", req.path(), query),
                };
                if let Some(back) = manager.handle_back_navigation(&session, &current).await {
                    let location = match back.target {
                        Some(target) => {
                            info!(
                                "Returning session {} from '{}' to {}",
                                session.id(),
                                back.position,
                                target
                            );
                            target
                        }
                        None => {
                            debug!(
                                "Return marker for '{}' had nothing stashed, dropping it",
                                back.position
                            );
                            back.cleaned_url
                        }
                    };
                    return Ok(req.into_response(
                        HttpResponse::Found()
                            .insert_header((LOCATION, location))
                            .finish()
                            .map_into_right_body(),
                    ));
                }
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}
