use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{
        StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

use crate::api::error_code::ErrorCode;
use crate::api::helpers::error_response;

/// Bearer 共享密钥认证
///
/// 密钥未配置时拒绝所有请求
#[derive(Clone)]
pub struct BearerAuth {
    secret: Rc<str>,
    realm: &'static str,
}

impl BearerAuth {
    pub fn new(secret: impl AsRef<str>, realm: &'static str) -> Self {
        Self {
            secret: Rc::from(secret.as_ref()),
            realm,
        }
    }
}

/// 常量时间比较 `Authorization: Bearer <secret>`
pub fn bearer_matches(header: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        return false;
    };
    token.trim().as_bytes().ct_eq(secret.as_bytes()).into()
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        if self.secret.is_empty() {
            warn!("{} secret not configured - all requests will be rejected", self.realm);
        }
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
            realm: self.realm,
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    secret: Rc<str>,
    realm: &'static str,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
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
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let authorized = bearer_matches(header, &self.secret);
        let realm = self.realm;

        Box::pin(async move {
            if !authorized {
                warn!("{} authentication failed for {}", realm, req.path());
                let mut resp =
                    error_response(StatusCode::UNAUTHORIZED, ErrorCode::AuthFailed, "Unauthorized");
                if let Ok(value) = format!("Bearer realm=\"{}\"", realm).parse() {
                    resp.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
                return Ok(req.into_response(resp.map_into_right_body()));
            }

            trace!("{} authentication successful", realm);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_matches() {
        assert!(bearer_matches(Some("Bearer s3cret"), "s3cret"));
        assert!(!bearer_matches(Some("Bearer wrong"), "s3cret"));
        assert!(!bearer_matches(Some("s3cret"), "s3cret"));
        assert!(!bearer_matches(None, "s3cret"));
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        assert!(!bearer_matches(Some("Bearer "), ""));
        assert!(!bearer_matches(Some("Bearer anything"), ""));
    }
}
