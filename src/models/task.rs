use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;
use crate::models::user::Assignee;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a wire value. Anything outside the three statuses is a `ValidationError`.
impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::ValidationError("Invalid status".into()))
    }
}

/// A task as returned by the API, with the assignee relation eager-loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to_id: Option<i32>,
    /// Populated from the users table whenever `assigned_to_id` is set.
    pub assigned_to: Option<Assignee>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of `POST /tasks`.
///
/// `status` stays a raw string so an out-of-set value surfaces as a
/// `ValidationError` instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    /// Must be between 1 and 200 characters, and not only whitespace.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_to_id: Option<i32>,
}

/// Payload of `PATCH /tasks/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub task_id: Option<i32>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Payload of `PATCH /tasks/assign`. A missing or null `assignedToId` unassigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskInput {
    pub task_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
}

/// Payload of `DELETE /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskInput {
    pub task_id: Option<i32>,
}

/// Query parameters accepted by `GET /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<String>,
    /// Case-insensitive substring matched against title and description.
    pub search: Option<String>,
}

/// Row filter handed to the store. `assigned_to_id` carries the role scoping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub assigned_to_id: Option<i32>,
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
}

/// Validated fields of a task about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to_id: Option<i32>,
}

/// The only fields an update may touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none()
    }
}

/// Aggregate counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
    pub total_users: i64,
}

impl TaskStats {
    /// Folds per-status counts from the store into the dashboard shape.
    pub fn from_counts(counts: &[(TaskStatus, i64)], total_users: i64) -> Self {
        let mut stats = TaskStats {
            total_users,
            ..Default::default()
        };
        for (status, count) in counts {
            stats.total_tasks += count;
            match status {
                TaskStatus::Pending => stats.pending_tasks += count,
                TaskStatus::InProgress => stats.in_progress_tasks += count,
                TaskStatus::Done => stats.completed_tasks += count,
            }
        }
        stats
    }
}

/// Does `task` match the text part of a filter? Shared by stores that filter in memory.
pub fn matches_search(task: &Task, search: &str) -> bool {
    let needle = search.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
}
