use std::sync::Arc;
use validator::Validate;

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::{
    AssignTaskInput, CreateTaskInput, DeleteTaskInput, NewTask, Task, TaskChanges, TaskFilter,
    TaskQuery, TaskStats, TaskStatus, UpdateTaskInput,
};
use crate::store::Store;

/// Task operations with the role rules applied.
///
/// Admins see and manage every task. Plain users see only the tasks assigned to them and
/// may change the description or status of those tasks, nothing else.
pub struct TaskService {
    store: Arc<dyn Store>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>, AppError> {
    raw.map(str::parse).transpose()
}

fn require_task_id(task_id: Option<i32>) -> Result<i32, AppError> {
    task_id.ok_or_else(|| AppError::BadRequest("Task ID is required".into()))
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: i32) -> Result<(), AppError> {
        match self.store.find_user_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Assigned user not found".into())),
        }
    }

    /// Admin only. The title is trimmed and must not be blank; status defaults to
    /// `pending`.
    pub async fn create(&self, identity: &Identity, input: CreateTaskInput) -> Result<Task, AppError> {
        identity.require_admin()?;
        input.validate()?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".into()));
        }
        let status = parse_status(input.status.as_deref())?.unwrap_or_default();
        if let Some(assignee) = input.assigned_to_id {
            self.require_user(assignee).await?;
        }

        let task = self
            .store
            .create_task(NewTask {
                title: title.to_string(),
                description: input.description,
                status,
                assigned_to_id: input.assigned_to_id,
            })
            .await?;
        log::info!("User {} created task {}", identity.user_id, task.id);
        Ok(task)
    }

    /// Newest first. A plain user only ever sees tasks assigned to them, whatever the
    /// query says.
    pub async fn list(&self, identity: &Identity, query: TaskQuery) -> Result<Vec<Task>, AppError> {
        let status = parse_status(query.status.as_deref().filter(|s| !s.is_empty()))?;
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let filter = TaskFilter {
            assigned_to_id: if identity.is_admin() {
                None
            } else {
                Some(identity.user_id)
            },
            status,
            search,
        };
        self.store.list_tasks(&filter).await
    }

    /// Checks run in a fixed order: missing id, unknown task, ownership, then payload.
    /// A rejected update leaves the task untouched.
    pub async fn update(&self, identity: &Identity, input: UpdateTaskInput) -> Result<Task, AppError> {
        let task_id = require_task_id(input.task_id)?;
        let task = self.store.find_task(task_id).await?.ok_or_else(task_not_found)?;

        if !identity.is_admin() && task.assigned_to_id != Some(identity.user_id) {
            log::warn!(
                "User {} denied update of task {} assigned to {:?}",
                identity.user_id,
                task_id,
                task.assigned_to_id
            );
            return Err(AppError::Forbidden("Forbidden".into()));
        }

        input.validate()?;
        let changes = TaskChanges {
            status: parse_status(input.status.as_deref())?,
            description: input.description,
        };
        if changes.is_empty() {
            return Err(AppError::ValidationError(
                "Provide a description or status to update".into(),
            ));
        }

        let updated = self
            .store
            .update_task(task_id, changes)
            .await?
            .ok_or_else(task_not_found)?;
        log::info!("User {} updated task {}", identity.user_id, task_id);
        Ok(updated)
    }

    /// Admin only. A `None` assignee clears the assignment.
    pub async fn assign(&self, identity: &Identity, input: AssignTaskInput) -> Result<Task, AppError> {
        identity.require_admin()?;
        let task_id = require_task_id(input.task_id)?;
        if self.store.find_task(task_id).await?.is_none() {
            return Err(task_not_found());
        }
        if let Some(assignee) = input.assigned_to_id {
            self.require_user(assignee).await?;
        }

        let task = self
            .store
            .set_assignee(task_id, input.assigned_to_id)
            .await?
            .ok_or_else(task_not_found)?;
        match task.assigned_to_id {
            Some(assignee) => log::info!("Task {} assigned to user {}", task_id, assignee),
            None => log::info!("Task {} unassigned", task_id),
        }
        Ok(task)
    }

    /// Admin only. Returns the id of the removed task.
    pub async fn delete(&self, identity: &Identity, input: DeleteTaskInput) -> Result<i32, AppError> {
        identity.require_admin()?;
        let task_id = require_task_id(input.task_id)?;
        if !self.store.delete_task(task_id).await? {
            return Err(task_not_found());
        }
        log::info!("User {} deleted task {}", identity.user_id, task_id);
        Ok(task_id)
    }

    /// Admin only.
    pub async fn stats(&self, identity: &Identity) -> Result<TaskStats, AppError> {
        identity.require_admin()?;
        let counts = self.store.count_tasks_by_status().await?;
        let total_users = self.store.count_users().await?;
        Ok(TaskStats::from_counts(&counts, total_users))
    }
}
