/// Comment model and data access
///
/// Comments belong to exactly one task and are read and written through
/// that task. They are never updated or deleted on their own; the only
/// way a comment disappears is the cascade when its task is deleted.
///
/// # Database Schema
///
/// ```text
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Comment database record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,

    pub task_id: Uuid,

    /// Author; NULLed if that user is later deleted
    pub user_id: Option<Uuid>,

    /// Trimmed, non-empty text
    pub body: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment, already validated by the service
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
}

const COMMENT_COLUMNS: &str = "id, task_id, user_id, body, created_at";

impl Comment {
    /// Inserts a comment. Fails with a foreign-key violation if the task
    /// was deleted concurrently; the service maps that to "Task not
    /// found" so no orphaned comment can ever land.
    pub async fn create(
        db: impl PgExecutor<'_>,
        data: CreateComment,
        created_at: DateTime<Utc>,
    ) -> Result<Comment, sqlx::Error> {
        let sql = format!(
            "INSERT INTO comments (task_id, user_id, body, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COMMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Comment>(&sql)
            .bind(data.task_id)
            .bind(data.user_id)
            .bind(data.body)
            .bind(created_at)
            .fetch_one(db)
            .await
    }

    /// All comments on a task, oldest first
    pub async fn list_for_task(
        db: impl PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE task_id = $1 \
             ORDER BY created_at ASC"
        );

        sqlx::query_as::<_, Comment>(&sql)
            .bind(task_id)
            .fetch_all(db)
            .await
    }
}
