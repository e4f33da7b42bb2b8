use crate::{auth::AdminUser, error::AppError, models::UserSummary, services::AccountService};
use actix_web::{get, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

/// Lists every account, newest first. Admin only.
///
/// Password hashes are never part of the response.
#[get("")]
pub async fn list_users(
    admin: AdminUser,
    accounts: web::Data<AccountService>,
) -> Result<impl Responder, AppError> {
    let users = accounts.list_users(&admin.0).await?;
    Ok(HttpResponse::Ok().json(UserListResponse { users }))
}
