use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

use super::Store;
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{
    Assignee, NewTask, NewUser, Task, TaskChanges, TaskFilter, TaskStatus, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Projection shared by every task read. `t` is the task row, `u` its assignee.
const TASK_PROJECTION: &str = "SELECT t.id, t.title, t.description, t.status, t.assigned_to_id, \
     t.created_at, t.updated_at, u.name AS assignee_name, u.email AS assignee_email";

const TASK_JOIN: &str = "LEFT JOIN users u ON u.id = t.assigned_to_id";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    assigned_to_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let assigned_to = match (row.assigned_to_id, row.assignee_name, row.assignee_email) {
            (Some(id), Some(name), Some(email)) => Some(Assignee { id, name, email }),
            _ => None,
        };
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            assigned_to_id: row.assigned_to_id,
            assigned_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escapes `LIKE` metacharacters so user input is matched literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Postgres-backed store. Owns the process-wide connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and verifies the database answers.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        log::info!(
            "Connecting to Postgres (max_connections = {})",
            config.max_connections
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await?;

        let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await?;
        if one != 1 {
            return Err(AppError::DatabaseError(
                "Health check returned unexpected value".into(),
            ));
        }
        Ok(Self::new(pool))
    }

    /// Applies pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))?;
        log::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "WITH t AS (\
                INSERT INTO tasks (title, description, status, assigned_to_id) \
                VALUES ($1, $2, $3, $4) RETURNING *\
             ) {} FROM t {}",
            TASK_PROJECTION, TASK_JOIN
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(&new_task.title)
            .bind(&new_task.description)
            .bind(new_task.status)
            .bind(new_task.assigned_to_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_task(&self, id: i32) -> Result<Option<Task>, AppError> {
        let sql = format!("{} FROM tasks t {} WHERE t.id = $1", TASK_PROJECTION, TASK_JOIN);
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut sql = format!("{} FROM tasks t {}", TASK_PROJECTION, TASK_JOIN);
        let mut conditions: Vec<String> = Vec::new();
        let mut param_count = 1;

        if filter.assigned_to_id.is_some() {
            conditions.push(format!("t.assigned_to_id = ${}", param_count));
            param_count += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("t.status = ${}", param_count));
            param_count += 1;
        }
        if filter.search.is_some() {
            conditions.push(format!(
                "(t.title ILIKE ${0} OR t.description ILIKE ${0})",
                param_count
            ));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut query = sqlx::query_as::<_, TaskRow>(&sql);
        if let Some(assigned_to_id) = filter.assigned_to_id {
            query = query.bind(assigned_to_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(search) = &filter.search {
            query = query.bind(like_pattern(search));
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, id: i32, changes: TaskChanges) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "WITH t AS (\
                UPDATE tasks SET description = COALESCE($2, description), \
                status = COALESCE($3, status), updated_at = NOW() \
                WHERE id = $1 RETURNING *\
             ) {} FROM t {}",
            TASK_PROJECTION, TASK_JOIN
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(changes.description)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn set_assignee(&self, id: i32, assignee: Option<i32>) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "WITH t AS (\
                UPDATE tasks SET assigned_to_id = $2, updated_at = NOW() \
                WHERE id = $1 RETURNING *\
             ) {} FROM t {}",
            TASK_PROJECTION, TASK_JOIN
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(assignee)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn delete_task(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_tasks_by_status(&self) -> Result<Vec<(TaskStatus, i64)>, AppError> {
        Ok(
            sqlx::query_as::<_, (TaskStatus, i64)>(
                "SELECT status, COUNT(*) FROM tasks GROUP BY status",
            )
            .fetch_all(&self.pool)
            .await?,
        )
    }

    async fn close(&self) {
        self.pool.close().await;
        log::info!("Database pool closed");
    }
}
