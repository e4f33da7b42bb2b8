mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{
    admin_token, bearer, bearer_resolver, login_token, register, register_and_login, send,
    session_resolver, test_state, ADMIN_EMAIL, PASSWORD, TEST_SECRET,
};
use taskdesk::auth::session::SESSION_COOKIE;
use taskdesk::auth::TokenService;
use taskdesk::models::Role;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let (status, body) = register(&app, "Integration User", "Integration@Example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], "integration@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["createdAt"].is_string());
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password").is_none());

    // Same address, different case: still a duplicate.
    let (status, body) = register(&app, "Again", "integration@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::CONFLICT, "duplicate registration: {}", body);
    assert_eq!(body["message"], "User already exists");

    let token = login_token(&app, "INTEGRATION@example.com", PASSWORD).await;
    assert!(!token.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tasks": [] }));
}

#[actix_rt::test]
async fn test_register_rejects_invalid_payloads() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    for password in ["", "12345"] {
        let (status, body) = register(&app, "Short", "short@example.com", password).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    let (status, _) = register(&app, "Bad Email", "not-an-email", PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Well-formed but wider than the email column.
    let long_email = format!(
        "{}@{}.{}.{}.{}.com",
        "a".repeat(64),
        "b".repeat(63),
        "c".repeat(63),
        "d".repeat(63),
        "e".repeat(40)
    );
    assert!(long_email.len() >= 300);
    let (status, body) = register(&app, "Long Email", &long_email, PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "noname@example.com", "password": PASSWORD }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    // Nothing was created along the way.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "short@example.com", "password": "12345" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_self_registration_cannot_claim_admin() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Mallory",
            "email": "mallory@example.com",
            "password": PASSWORD,
            "role": "admin"
        }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");

    let token = login_token(&app, "mallory@example.com", PASSWORD).await;
    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    register_and_login(&app, "Known", "known@example.com").await;

    for (email, password) in [
        ("known@example.com", "wrong-password"),
        ("unknown@example.com", PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Invalid credentials" }));
    }
}

#[actix_rt::test]
async fn test_gate_rejects_missing_and_bad_tokens() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let (user_id, token) = register_and_login(&app, "Victim", "victim@example.com").await;
    let admin = admin_token(&app).await;

    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    // The user's header and signature around the admin's claims.
    let user_parts: Vec<&str> = token.split('.').collect();
    let admin_parts: Vec<&str> = admin.split('.').collect();
    let spliced = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

    let expired = TokenService::new(TEST_SECRET, -2)
        .issue(user_id as i32, Role::User)
        .unwrap();
    let foreign = TokenService::new("some_other_secret_that_is_long_enough!!", 24)
        .issue(user_id as i32, Role::Admin)
        .unwrap();

    for bad in [spliced.as_str(), expired.as_str(), foreign.as_str(), "not-a-jwt"] {
        let req = test::TestRequest::get()
            .uri("/api/tasks")
            .insert_header(bearer(bad))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {:?} was accepted", bad);
        assert_eq!(body["message"], "Invalid token");
    }
}

#[actix_rt::test]
async fn test_users_listing_is_admin_only() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;
    let (_, token) = register_and_login(&app, "Plain", "plain@example.com").await;
    let admin = admin_token(&app).await;

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Forbidden" }));

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let users = body["users"].as_array().unwrap();
    let emails: Vec<&str> = users.iter().filter_map(|u| u["email"].as_str()).collect();
    assert_eq!(emails, vec!["plain@example.com", ADMIN_EMAIL]);
    for user in users {
        let mut keys: Vec<&str> = user.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["createdAt", "email", "id", "name", "role"]);
    }
}

#[actix_rt::test]
async fn test_session_mode_login_and_logout() {
    let state = test_state(session_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let (status, _) = register(&app, "Cookie Monster", "cookie@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "cookie@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .expect("login did not set the session cookie");
    assert_eq!(session.http_only(), Some(true));
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body.get("token").is_none());
    assert_eq!(body["user"]["email"], "cookie@example.com");

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .cookie(session.clone())
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    // A bearer token means nothing in session mode.
    let bearer_only = TokenService::new(TEST_SECRET, 24).issue(1, Role::Admin).unwrap();
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&bearer_only))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut forged = session.clone();
    forged.set_value(format!("{}x", session.value()));
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .cookie(forged)
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post().uri("/api/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let removal = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string());
    assert_eq!(removal.as_deref(), Some(""));
}

#[actix_rt::test]
async fn test_health_is_not_gated() {
    let state = test_state(bearer_resolver()).await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
