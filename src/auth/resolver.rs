//! The single seam between the authorization gate and the active credential scheme.
//!
//! Exactly one [`IdentityResolver`] is selected at process start and shared with the
//! application as `web::Data<dyn IdentityResolver>`. The gate, the login route and the
//! logout route only ever talk to the trait.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::HttpRequest;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::identity::Identity;
use crate::auth::session::SessionService;
use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::models::User;

/// Which credential scheme the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <jwt>` on every request.
    Bearer,
    /// HTTP-only session cookie set at login.
    Session,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthMode::Bearer => write!(f, "bearer"),
            AuthMode::Session => write!(f, "session"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bearer" | "token" | "jwt" => Ok(AuthMode::Bearer),
            "session" | "cookie" => Ok(AuthMode::Session),
            other => Err(format!("unknown auth mode '{}'", other)),
        }
    }
}

/// What a successful login hands back to the client.
#[derive(Debug)]
pub enum Credential {
    Bearer(String),
    Cookie(Cookie<'static>),
}

/// Recovers the caller's identity from a request and issues credentials at login.
///
/// Credentials embed the role at issuance time. Changing a user's role has no effect on
/// credentials already handed out; the user must log in again.
pub trait IdentityResolver: Send + Sync {
    fn mode(&self) -> AuthMode;

    /// `Ok(None)`: no credential present. `Err`: a credential was present but is
    /// invalid. The gate treats both as unauthenticated.
    fn resolve(&self, req: &HttpRequest) -> Result<Option<Identity>, AppError>;

    fn establish(&self, user: &User) -> Result<Credential, AppError>;

    /// Cookie that ends the client's session, if the scheme has one to end.
    fn revoke(&self) -> Option<Cookie<'static>>;
}

pub struct BearerResolver {
    tokens: TokenService,
}

impl BearerResolver {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

/// Returns the token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl IdentityResolver for BearerResolver {
    fn mode(&self) -> AuthMode {
        AuthMode::Bearer
    }

    fn resolve(&self, req: &HttpRequest) -> Result<Option<Identity>, AppError> {
        match bearer_token(req) {
            Some(token) => {
                let claims = self.tokens.verify(token)?;
                Ok(Some(Identity::new(claims.sub, claims.role)))
            }
            None => Ok(None),
        }
    }

    fn establish(&self, user: &User) -> Result<Credential, AppError> {
        self.tokens
            .issue(user.id, user.role)
            .map(Credential::Bearer)
    }

    fn revoke(&self) -> Option<Cookie<'static>> {
        None
    }
}

pub struct SessionResolver {
    sessions: SessionService,
}

impl SessionResolver {
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }
}

impl IdentityResolver for SessionResolver {
    fn mode(&self) -> AuthMode {
        AuthMode::Session
    }

    fn resolve(&self, req: &HttpRequest) -> Result<Option<Identity>, AppError> {
        Ok(self
            .sessions
            .resolve(req)?
            .map(|claims| Identity::new(claims.sub, claims.role)))
    }

    fn establish(&self, user: &User) -> Result<Credential, AppError> {
        self.sessions.establish(user).map(Credential::Cookie)
    }

    fn revoke(&self) -> Option<Cookie<'static>> {
        Some(self.sessions.clear())
    }
}

/// Builds the resolver for the configured mode.
pub fn resolver_for(auth: &crate::config::AuthConfig) -> Arc<dyn IdentityResolver> {
    match auth.mode {
        AuthMode::Bearer => Arc::new(BearerResolver::new(TokenService::new(
            &auth.secret,
            auth.ttl_hours,
        ))),
        AuthMode::Session => Arc::new(SessionResolver::new(SessionService::new(
            &auth.secret,
            auth.ttl_hours,
            auth.secure_cookie,
        ))),
    }
}
