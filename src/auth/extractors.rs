use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::identity::Identity;
use crate::error::AppError;

/// Extracts the identity the gate attached to the request.
///
/// Only usable on routes wrapped by `AuthMiddleware`. If the identity is missing the
/// extractor fails closed with `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_of(req).map(AuthenticatedUser).map_err(Into::into))
    }
}

/// Like [`AuthenticatedUser`], but additionally requires the admin role.
///
/// Place it before any body extractor in a handler's arguments: extractors run in
/// order, so a non-admin is refused with 403 before the payload is even parsed.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Identity);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = identity_of(req).and_then(|identity| {
            identity.require_admin()?;
            Ok(AdminUser(identity))
        });
        ready(result.map_err(Into::into))
    }
}

fn identity_of(req: &HttpRequest) -> Result<Identity, AppError> {
    req.extensions()
        .get::<Identity>()
        .copied()
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))
}
