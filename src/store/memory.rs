use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::Store;
use crate::error::AppError;
use crate::models::task::matches_search;
use crate::models::{
    Assignee, NewTask, NewUser, Task, TaskChanges, TaskFilter, TaskStatus, User,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    tasks: BTreeMap<i32, Task>,
    next_user_id: i32,
    next_task_id: i32,
}

impl Tables {
    /// Returns the task with its assignee relation refreshed from `users`.
    fn load(&self, task: &Task) -> Task {
        let mut task = task.clone();
        task.assigned_to = task
            .assigned_to_id
            .and_then(|id| self.users.get(&id))
            .map(Assignee::from);
        task
    }

    fn require_user(&self, id: Option<i32>) -> Result<(), AppError> {
        match id {
            Some(id) if !self.users.contains_key(&id) => {
                Err(AppError::NotFound("Assigned user not found".into()))
            }
            _ => Ok(()),
        }
    }
}

/// In-process store backed by ordered maps behind a `tokio` read-write lock.
///
/// Ids are assigned sequentially from 1, like a `SERIAL` column.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().rev().cloned().collect())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_task.assigned_to_id)?;

        tables.next_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: tables.next_task_id,
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            assigned_to_id: new_task.assigned_to_id,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(tables.load(&task))
    }

    async fn find_task(&self, id: i32) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).map(|task| tables.load(task)))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| filter.assigned_to_id.map_or(true, |id| t.assigned_to_id == Some(id)))
            .filter(|t| filter.status.map_or(true, |status| t.status == status))
            .filter(|t| filter.search.as_deref().map_or(true, |s| matches_search(t, s)))
            .map(|t| tables.load(t))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn update_task(&self, id: i32, changes: TaskChanges) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        let task = match tables.tasks.get_mut(&id) {
            Some(task) => task,
            None => return Ok(None),
        };
        if let Some(description) = changes.description {
            task.description = Some(description);
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        let task = task.clone();
        Ok(Some(tables.load(&task)))
    }

    async fn set_assignee(&self, id: i32, assignee: Option<i32>) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Ok(None);
        }
        tables.require_user(assignee)?;

        let task = match tables.tasks.get_mut(&id) {
            Some(task) => task,
            None => return Ok(None),
        };
        task.assigned_to_id = assignee;
        task.updated_at = Utc::now();

        let task = task.clone();
        Ok(Some(tables.load(&task)))
    }

    async fn delete_task(&self, id: i32) -> Result<bool, AppError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn count_tasks_by_status(&self) -> Result<Vec<(TaskStatus, i64)>, AppError> {
        let tables = self.tables.read().await;
        Ok(TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let count = tables.tasks.values().filter(|t| t.status == status).count();
                (status, count as i64)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn close(&self) {
        log::info!("In-memory store closed");
    }
}
