//! Persistence for users and tasks.
//!
//! [`Store`] is the contract the services depend on. [`PgStore`] is the production
//! implementation; [`MemoryStore`] keeps everything in process and enforces the same
//! constraints, which makes it suitable for tests and throwaway local runs.
//!
//! Writes are single-row and last-writer-wins. No version or ETag is checked, so two
//! concurrent updates to the same task race without conflict detection.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, TaskFilter, TaskStatus, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. A taken email fails with `AppError::Conflict`.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Looks up by exact email; callers pass the normalized form.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn count_users(&self) -> Result<i64, AppError>;

    /// Inserts a task. An `assigned_to_id` without a matching user fails with
    /// `AppError::NotFound`.
    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError>;

    async fn find_task(&self, id: i32) -> Result<Option<Task>, AppError>;

    /// Tasks matching every set field of `filter`, newest first.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    /// Applies the set fields of `changes`. `Ok(None)` if the task does not exist.
    async fn update_task(&self, id: i32, changes: TaskChanges) -> Result<Option<Task>, AppError>;

    /// Sets or clears the assignee. `Ok(None)` if the task does not exist.
    async fn set_assignee(&self, id: i32, assignee: Option<i32>) -> Result<Option<Task>, AppError>;

    /// `Ok(false)` if there was no such task.
    async fn delete_task(&self, id: i32) -> Result<bool, AppError>;

    async fn count_tasks_by_status(&self) -> Result<Vec<(TaskStatus, i64)>, AppError>;

    /// Releases underlying resources. Called once on shutdown.
    async fn close(&self);
}
