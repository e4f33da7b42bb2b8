use crate::{auth::AdminUser, error::AppError, services::TaskService};
use actix_web::{get, web, HttpResponse, Responder};

/// Dashboard counters: tasks per status and the number of users. Admin only.
#[get("")]
pub async fn get_stats(
    admin: AdminUser,
    tasks: web::Data<TaskService>,
) -> Result<impl Responder, AppError> {
    let stats = tasks.stats(&admin.0).await?;
    Ok(HttpResponse::Ok().json(stats))
}
