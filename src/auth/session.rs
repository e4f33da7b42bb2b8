//! Cookie-backed sessions.
//!
//! The session artifact is a signed JWT holding the user's id, name, email and role,
//! stored in an HTTP-only cookie. Requests are resolved from the cookie alone, without a
//! store lookup, so a profile or role change is only visible after the next login.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Role, User};

pub const SESSION_COOKIE: &str = "taskdesk_session";

/// Identity embedded in the session cookie at login time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    pub sub: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    secure: bool,
}

impl SessionService {
    pub fn new(secret: &str, ttl_hours: i64, secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
            secure,
        }
    }

    /// Builds the session cookie for a freshly authenticated user.
    pub fn establish(&self, user: &User) -> Result<Cookie<'static>, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        let value = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::InternalServerError(format!("Failed to sign session: {}", e))
        })?;

        Ok(Cookie::build(SESSION_COOKIE, value)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .finish())
    }

    /// `Ok(None)` when the request carries no session cookie, an error when it carries
    /// one that does not verify.
    pub fn resolve(&self, req: &HttpRequest) -> Result<Option<SessionClaims>, AppError> {
        let cookie = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => cookie,
            None => return Ok(None),
        };
        let data = decode::<SessionClaims>(cookie.value(), &self.decoding_key, &Validation::default())?;
        Ok(Some(data.claims))
    }

    /// A cookie that overwrites and expires the session cookie.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}
