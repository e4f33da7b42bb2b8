pub mod auth;
pub mod health;
pub mod stats;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Mounts the JSON API. Everything except `/auth` sits behind the gate.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::logout),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::assign_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(users::list_users),
    )
    .service(
        web::scope("/stats")
            .wrap(AuthMiddleware)
            .service(stats::get_stats),
    );
}

/// Renders query string failures (e.g. a repeated `status`) as `400 {"message": ...}`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        log::debug!("Rejected query on {} {}: {}", req.method(), req.path(), err);
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Renders body extraction failures (bad JSON, missing or mistyped fields) as
/// `400 {"message": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("Rejected body on {} {}: {}", req.method(), req.path(), err);
        AppError::BadRequest(err.to_string()).into()
    })
}
