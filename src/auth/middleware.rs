use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::resolver::IdentityResolver;
use crate::error::AppError;

/// The authorization gate.
///
/// Resolves the caller through the registered `web::Data<dyn IdentityResolver>` and
/// either attaches the resulting `Identity` to the request extensions or answers
/// `401` itself. Any verification failure is treated as unauthenticated; nothing is
/// passed through on error. Role requirements are enforced afterwards by the
/// `AdminUser` extractor.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let resolved = match req.app_data::<web::Data<dyn IdentityResolver>>() {
            Some(resolver) => resolver.resolve(req.request()),
            None => {
                log::error!("No identity resolver registered; rejecting {}", req.path());
                Ok(None)
            }
        };

        let rejection = match resolved {
            Ok(Some(identity)) => {
                req.extensions_mut().insert(identity);
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
            }
            Ok(None) => AppError::Unauthorized("Unauthorized".into()),
            Err(err) => {
                log::warn!("Rejected credential on {} {}: {}", req.method(), req.path(), err);
                AppError::Unauthorized("Invalid token".into())
            }
        };

        let response = req.error_response(rejection).map_into_right_body();
        Box::pin(async move { Ok(response) })
    }
}
