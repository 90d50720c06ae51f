use chrono::{DateTime, Utc};
use shared::Task;
use sqlx::FromRow;

use super::DbPool;

#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn insert_task(pool: &DbPool, task: &Task) -> Result<Task, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskRow>(
        "INSERT INTO tasks (id, title, description, completed_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING id, title, description, completed_at, created_at, updated_at",
    )
    .bind(&task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.completed_at)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(pool)
    .await?;

    tracing::debug!(task_id = %row.id, "task inserted");
    Ok(row.into())
}

pub async fn get_task(pool: &DbPool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskRow>(
        "SELECT id, title, description, completed_at, created_at, updated_at \
         FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Task::from))
}

/// Newest first. A search term keeps only tasks whose title or description
/// contains it, ignoring case across the whole of Unicode.
///
/// SQLite's `LIKE` folds ASCII letters only, so the term is matched here
/// rather than in SQL.
pub async fn list_tasks(pool: &DbPool, search: Option<&str>) -> Result<Vec<Task>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, title, description, completed_at, created_at, updated_at \
         FROM tasks \
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let tasks = rows.into_iter().map(Task::from);
    Ok(match search {
        Some(term) => {
            let needle = term.to_lowercase();
            tasks.filter(|task| matches_search(task, &needle)).collect()
        }
        None => tasks.collect(),
    })
}

/// Replaces the given fields and keeps the stored value for the others.
/// Returns `None` when no task has this id.
pub async fn update_task(
    pool: &DbPool,
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<Task>, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskRow>(
        "UPDATE tasks \
         SET title = COALESCE(?, title), \
             description = COALESCE(?, description), \
             updated_at = ? \
         WHERE id = ? \
         RETURNING id, title, description, completed_at, created_at, updated_at",
    )
    .bind(title)
    .bind(description)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if row.is_some() {
        tracing::debug!(task_id = id, "task updated");
    }
    Ok(row.map(Task::from))
}

/// Flips `completed_at` between NULL and `now` in a single statement.
pub async fn toggle_task_completion(
    pool: &DbPool,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Task>, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskRow>(
        "UPDATE tasks \
         SET completed_at = CASE WHEN completed_at IS NULL THEN ? ELSE NULL END, \
             updated_at = ? \
         WHERE id = ? \
         RETURNING id, title, description, completed_at, created_at, updated_at",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let task = row.map(Task::from);
    if let Some(task) = &task {
        tracing::debug!(
            task_id = id,
            completed = task.is_completed(),
            "task completion toggled"
        );
    }
    Ok(task)
}

/// Returns `false` when no task has this id.
pub async fn delete_task(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::debug!(task_id = id, "task deleted");
    }
    Ok(deleted)
}

// `needle` is already lower-cased.
fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle) || task.description.to_lowercase().contains(needle)
}
