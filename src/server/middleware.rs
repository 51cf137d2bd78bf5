//! Bearer-token authentication middleware.
//!
//! Simplified from the gateway's `AuthMiddleware`/`AuthMiddlewareService`
//! pair: same `Transform`/`Service` shape, same public-route bypass, but
//! without its brute-force lockout tracker (DESIGN.md records this as a
//! deliberate scope cut, not an oversight).

use crate::auth::ApiKeyPrincipal;
use crate::server::state::AppState;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{HttpMessage, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Routes reachable without a bearer token.
fn is_public_route(path: &str) -> bool {
    path == "/health"
}

/// Installs [`BearerAuthMiddlewareService`] in front of every guarded route.
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BearerAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddlewareService { service }))
    }
}

/// The installed service: validates `Authorization: Bearer dio-...` and
/// stashes the resolved [`ApiKeyPrincipal`] in request extensions.
pub struct BearerAuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        if is_public_route(&path) {
            debug!(path = %path, "skipping auth for public route");
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await });
        }

        let token = req
            .headers()
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("app state not found")
            })?;
            let token = token
                .ok_or_else(|| actix_web::Error::from(crate::error::OrchestratorError::Unauthorized))?;

            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock before unix epoch")
                .as_secs() as i64;
            let key = state
                .auth
                .validate_api_key(&token, now)
                .await
                .map_err(actix_web::Error::from)?;

            req.extensions_mut().insert(ApiKeyPrincipal { email: key.email });

            let fut = self.service.call(req);
            fut.await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_public() {
        assert!(is_public_route("/health"));
    }

    #[test]
    fn inference_and_operator_routes_require_auth() {
        assert!(!is_public_route("/v1/models"));
        assert!(!is_public_route("/v1/chat/completions"));
        assert!(!is_public_route("/api/keys"));
        assert!(!is_public_route("/api/cluster"));
    }
}
