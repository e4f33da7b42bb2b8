use crate::{
    auth::{AdminUser, AuthenticatedUser},
    error::AppError,
    models::{AssignTaskInput, CreateTaskInput, DeleteTaskInput, Task, TaskQuery, UpdateTaskInput},
    services::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

/// Body returned by every route that creates or modifies a single task.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskResponse {
    pub message: String,
    pub task_id: i32,
}

/// Lists tasks visible to the caller.
///
/// Admins see every task; anyone else sees only the tasks assigned to them. Newest
/// first.
///
/// ## Query Parameters:
/// - `status` (optional): one of `pending`, `in-progress`, `done`.
/// - `search` (optional): case-insensitive match against title and description.
///
/// ## Responses:
/// - `200 OK`: `{"tasks": [...]}`.
/// - `400 Bad Request`: unknown `status`.
/// - `401 Unauthorized`: missing or invalid credential.
#[get("")]
pub async fn list_tasks(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list(&user.0, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TaskListResponse { tasks }))
}

/// Creates a task. Admin only.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters, not blank.
/// - `description` (optional).
/// - `status` (optional): defaults to `pending`.
/// - `assignedToId` (optional): must reference an existing user.
///
/// ## Responses:
/// - `201 Created`: `{"message", "task"}`.
/// - `400 Bad Request`, `401 Unauthorized`, `403 Forbidden`, `404 Not Found` (assignee).
#[post("")]
pub async fn create_task(
    admin: AdminUser,
    tasks: web::Data<TaskService>,
    task_data: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(&admin.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(TaskResponse {
        message: "Task created successfully".to_string(),
        task,
    }))
}

/// Changes the description and/or status of a task.
///
/// Allowed for admins and for the task's assignee.
///
/// ## Responses:
/// - `200 OK`: `{"message", "task"}`.
/// - `400 Bad Request`: missing `taskId`, unknown status, or nothing to change.
/// - `401 Unauthorized`, `403 Forbidden`, `404 Not Found`.
#[patch("/update")]
pub async fn update_task(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks.update(&user.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// Sets or clears a task's assignee. Admin only.
///
/// A missing or `null` `assignedToId` unassigns the task.
#[patch("/assign")]
pub async fn assign_task(
    admin: AdminUser,
    tasks: web::Data<TaskService>,
    assignment: web::Json<AssignTaskInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks.assign(&admin.0, assignment.into_inner()).await?;
    let message = if task.assigned_to_id.is_some() {
        "Task assigned successfully"
    } else {
        "Task unassigned successfully"
    };
    Ok(HttpResponse::Ok().json(TaskResponse {
        message: message.to_string(),
        task,
    }))
}

/// Deletes a task. Admin only.
///
/// ## Responses:
/// - `200 OK`: `{"message", "taskId"}`.
/// - `400 Bad Request`: missing `taskId`.
/// - `401 Unauthorized`, `403 Forbidden`, `404 Not Found`.
#[delete("")]
pub async fn delete_task(
    admin: AdminUser,
    tasks: web::Data<TaskService>,
    target: web::Json<DeleteTaskInput>,
) -> Result<impl Responder, AppError> {
    let task_id = tasks.delete(&admin.0, target.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeleteTaskResponse {
        message: "Task deleted successfully".to_string(),
        task_id,
    }))
}
