use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{StatusCode, header::RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::api::error_code::ErrorCode;
use crate::api::helpers::error_response;
use crate::services::{FixedWindowRateLimiter, RateDecision};
use crate::utils::client_key;

/// 固定窗口限流，按客户端地址计数，在认证之前执行
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<FixedWindowRateLimiter>,
    trusted_proxies: Rc<[String]>,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<FixedWindowRateLimiter>, trusted_proxies: &[String]) -> Self {
        Self {
            limiter,
            trusted_proxies: Rc::from(trusted_proxies),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trusted_proxies: self.trusted_proxies.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<FixedWindowRateLimiter>,
    trusted_proxies: Rc<[String]>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let key = client_key(req.request(), &self.trusted_proxies);
        let decision = self.limiter.check(&key);

        Box::pin(async move {
            if let RateDecision::Rejected { retry_after } = decision {
                warn!("Rate limit exceeded for {} on {}", key, req.path());
                let mut resp = error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorCode::RateLimitExceeded,
                    "Too many requests. Please try again later.",
                );
                let secs = retry_after.as_secs().max(1);
                if let Ok(value) = secs.to_string().parse() {
                    resp.headers_mut().insert(RETRY_AFTER, value);
                }
                return Ok(req.into_response(resp.map_into_right_body()));
            }

            trace!("Rate limit check passed for {}", key);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
