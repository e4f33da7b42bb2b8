#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::{json, Value};
use std::sync::Arc;

use taskdesk::auth::password::MIN_COST;
use taskdesk::auth::{
    BearerResolver, IdentityResolver, PasswordHasher, SessionResolver, SessionService, TokenService,
};
use taskdesk::config::AdminSeed;
use taskdesk::store::{MemoryStore, Store};
use taskdesk::AppState;

pub const TEST_SECRET: &str = "integration_test_secret_0123456789abcdef";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "secret1";

pub fn bearer_resolver() -> Arc<dyn IdentityResolver> {
    Arc::new(BearerResolver::new(TokenService::new(TEST_SECRET, 24)))
}

pub fn session_resolver() -> Arc<dyn IdentityResolver> {
    Arc::new(SessionResolver::new(SessionService::new(TEST_SECRET, 24, false)))
}

/// Fresh in-memory state with the bootstrap admin already created.
pub async fn test_state(resolver: Arc<dyn IdentityResolver>) -> AppState {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState::new(store, PasswordHasher::new(MIN_COST).unwrap(), resolver);
    state
        .accounts()
        .ensure_admin(&AdminSeed {
            name: "Admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        })
        .await
        .unwrap();
    state
}

/// Runs the request and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
        })
    };
    (status, body)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    name: &str,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    send(app, req).await
}

/// Logs in through the bearer scheme and returns the token.
pub async fn login_token(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| panic!("login response without token: {}", body))
}

/// Registers a plain user and logs them in. Returns `(user id, token)`.
pub async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    name: &str,
    email: &str,
) -> (i64, String) {
    let (status, body) = register(app, name, email, PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    let id = body["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("registration response without id: {}", body));
    (id, login_token(app, email, PASSWORD).await)
}

pub async fn admin_token(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
) -> String {
    login_token(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}
