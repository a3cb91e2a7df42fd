//! Task persistence, scoped to the owning user.
//!
//! Every query conjoins the caller's `user_id` with the item filter, so a
//! task owned by another user is indistinguishable from a missing one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::task::{Priority, Status};
use crate::uuid::uuidv7;

/// Row returned by task queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, user_id, title, description, priority, status, created_at";

/// List tasks for a user, newest first.
pub async fn list_tasks(pool: &PgPool, user_id: &Uuid) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Create a new task owned by `user_id`.
pub async fn create_task(
    pool: &PgPool,
    user_id: &Uuid,
    title: &str,
    description: &str,
    priority: Priority,
    status: Status,
) -> Result<TaskRow, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "INSERT INTO tasks (id, user_id, title, description, priority, status) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {TASK_COLUMNS}",
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(title)
    .bind(description)
    .bind(priority.as_str())
    .bind(status.as_str())
    .fetch_one(pool)
    .await
}

/// Get a task by ID (scoped to user).
pub async fn get_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2",
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Field subset for a partial task update. Absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl TaskUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

/// Apply a partial update to a task (scoped to user), returning the updated row.
///
/// Only fields present in `update` appear in the SET clause. With no fields
/// set this degenerates to a plain fetch; callers reject empty updates
/// before reaching storage.
pub async fn update_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
    update: &TaskUpdate,
) -> Result<Option<TaskRow>, sqlx::Error> {
    if update.is_empty() {
        return get_task(pool, user_id, task_id).await;
    }

    let mut sets = Vec::new();
    let mut binds: Vec<&str> = Vec::new();

    if let Some(title) = &update.title {
        binds.push(title);
        sets.push(format!("title = ${}", binds.len()));
    }
    if let Some(description) = &update.description {
        binds.push(description);
        sets.push(format!("description = ${}", binds.len()));
    }
    if let Some(priority) = &update.priority {
        binds.push(priority.as_str());
        sets.push(format!("priority = ${}", binds.len()));
    }
    if let Some(status) = &update.status {
        binds.push(status.as_str());
        sets.push(format!("status = ${}", binds.len()));
    }

    let query = format!(
        "UPDATE tasks SET {} WHERE id = ${} AND user_id = ${} RETURNING {TASK_COLUMNS}",
        sets.join(", "),
        binds.len() + 1,
        binds.len() + 2,
    );

    let mut q = sqlx::query_as::<_, TaskRow>(&query);
    for bind in binds {
        q = q.bind(bind);
    }
    q.bind(task_id).bind(user_id).fetch_optional(pool).await
}

/// Delete a task (scoped to user). Returns whether a row was removed.
pub async fn delete_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_update_is_empty() {
        assert!(TaskUpdate::default().is_empty());

        let update = TaskUpdate {
            status: Some(Status::Done),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
