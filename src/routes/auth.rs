use crate::{
    auth::{Credential, IdentityResolver, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    error::AppError,
    models::UserSummary,
    services::AccountService,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates a plain `user` account. Any `role` in the body is ignored.
#[post("/register")]
pub async fn register(
    accounts: web::Data<AccountService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts.register(register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user: UserSummary::from(&user),
    }))
}

/// Login user
///
/// Checks the credentials and hands out whatever credential the active identity
/// scheme uses: a bearer token in the body, or a session cookie.
#[post("/login")]
pub async fn login(
    accounts: web::Data<AccountService>,
    resolver: web::Data<dyn IdentityResolver>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts.authenticate(login_data.into_inner()).await?;
    let summary = UserSummary::from(&user);

    let response = match resolver.establish(&user)? {
        Credential::Bearer(token) => HttpResponse::Ok().json(LoginResponse {
            message: "Login successful".to_string(),
            token: Some(token),
            user: summary,
        }),
        Credential::Cookie(cookie) => HttpResponse::Ok().cookie(cookie).json(LoginResponse {
            message: "Login successful".to_string(),
            token: None,
            user: summary,
        }),
    };
    Ok(response)
}

/// Logout user
///
/// Clears the session cookie in session mode. Bearer tokens are stateless and stay
/// valid until they expire.
#[post("/logout")]
pub async fn logout(resolver: web::Data<dyn IdentityResolver>) -> impl Responder {
    let mut response = HttpResponse::Ok();
    if let Some(removal) = resolver.revoke() {
        response.cookie(removal);
    }
    response.json(json!({ "message": "Logged out" }))
}
