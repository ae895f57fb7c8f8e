/// Task model and data access
///
/// Tasks are the unit of work being tracked. A task may be assigned to one
/// user or left unassigned, carries a priority and a workflow status, and
/// optionally a start and due date (calendar dates, no time component).
///
/// The list queries here are the storage half of the query engine: they
/// take an already-resolved assignee restriction plus sort and pagination
/// arguments and return rows joined with display names. Scope resolution
/// and page clamping happen a layer up, in `query::TaskQueries`.
///
/// # Database Schema
///
/// ```text
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'pending',
///     start_date DATE,
///     due_date DATE,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Task priority, mirrors the `task_priority` Postgres enum.
///
/// Wire form is the capitalized word ("Low", "Medium", "High").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Parses the wire form. Exact match only.
    pub fn parse(input: &str) -> Option<TaskPriority> {
        match input {
            "Low" => Some(TaskPriority::Low),
            "Medium" => Some(TaskPriority::Medium),
            "High" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// Task workflow status, mirrors the `task_status` Postgres enum.
///
/// Wire form uses the display spelling ("Pending", "In Progress",
/// "Completed", "On Hold"). Any status may move to any other status;
/// there is no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On Hold",
        }
    }

    /// Parses the wire form. Exact match only; this is the vocabulary
    /// check behind the status update operation.
    pub fn parse(input: &str) -> Option<TaskStatus> {
        match input {
            "Pending" => Some(TaskStatus::Pending),
            "In Progress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            "On Hold" => Some(TaskStatus::OnHold),
            _ => None,
        }
    }
}

/// Sort key for task listings. Unknown request values fall back to
/// `CreatedAt` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    CreatedAt,
    DueDate,
    Status,
}

impl TaskSortKey {
    pub fn from_param(param: &str) -> TaskSortKey {
        match param {
            "due_date" => TaskSortKey::DueDate,
            "status" => TaskSortKey::Status,
            _ => TaskSortKey::CreatedAt,
        }
    }
}

/// Sort direction. Unknown request values fall back to `Desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_param(param: &str) -> SortDirection {
        match param.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Assignee restriction applied to task reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeSelector {
    /// No restriction
    Any,
    /// Only tasks with no assignee
    Unassigned,
    /// Only tasks assigned to this user
    User(Uuid),
}

impl AssigneeSelector {
    /// Parses the `assigned_to` filter parameter: `"unassigned"` or a user
    /// id. Anything else selects everything, mirroring how unknown sort
    /// keys fall back instead of failing.
    pub fn from_param(param: &str) -> AssigneeSelector {
        if param == "unassigned" {
            return AssigneeSelector::Unassigned;
        }
        match Uuid::parse_str(param) {
            Ok(id) => AssigneeSelector::User(id),
            Err(_) => AssigneeSelector::Any,
        }
    }
}

/// Task database record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// Current assignee; NULL means unassigned
    pub assigned_to: Option<Uuid>,

    pub priority: TaskPriority,

    pub status: TaskStatus,

    pub start_date: Option<NaiveDate>,

    pub due_date: Option<NaiveDate>,

    /// Creator; set on insert, NULLed if that user is later deleted
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task row joined with the display names of its assignee and creator.
/// Either name is NULL when the referenced user no longer exists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskWithNames {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task, already validated by the service
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
}

/// Partial update for a task.
///
/// The outer `Option` distinguishes "leave unchanged" from "set"; for the
/// nullable columns the inner `Option` distinguishes "set to a value"
/// from "clear to NULL".
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Per-status counts for the dashboard, plus the overdue count
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct StatusCounts {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub overdue: i64,
}

const TASK_COLUMNS: &str = "id, title, description, assigned_to, priority, status, \
                            start_date, due_date, created_by, created_at, updated_at";

const SELECT_WITH_NAMES: &str = "SELECT t.id, t.title, t.description, t.assigned_to, \
     a.name AS assigned_to_name, t.priority, t.status, t.start_date, t.due_date, \
     t.created_by, c.name AS created_by_name, t.created_at, t.updated_at \
     FROM tasks t \
     LEFT JOIN users a ON a.id = t.assigned_to \
     LEFT JOIN users c ON c.id = t.created_by";

/// Board rank used when sorting by status: Pending, In Progress, On Hold,
/// Completed. Ties fall back to most recently updated first.
const STATUS_RANK: &str = "CASE t.status \
     WHEN 'pending' THEN 1 \
     WHEN 'in_progress' THEN 2 \
     WHEN 'on_hold' THEN 3 \
     WHEN 'completed' THEN 4 \
     ELSE 5 END";

fn order_clause(sort_by: TaskSortKey, sort_dir: SortDirection) -> String {
    let dir = sort_dir.as_sql();
    match sort_by {
        TaskSortKey::CreatedAt => format!("t.created_at {dir}"),
        // Tasks without a due date always sort after the dated ones
        TaskSortKey::DueDate => format!("t.due_date {dir} NULLS LAST"),
        TaskSortKey::Status => format!("{STATUS_RANK} {dir}, t.updated_at DESC"),
    }
}

impl Task {
    /// Inserts a new task and returns the stored row
    pub async fn create(
        db: impl PgExecutor<'_>,
        data: CreateTask,
        now: DateTime<Utc>,
    ) -> Result<Task, sqlx::Error> {
        let sql = format!(
            "INSERT INTO tasks (title, description, assigned_to, priority, status, \
             start_date, due_date, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(data.title)
            .bind(data.description)
            .bind(data.assigned_to)
            .bind(data.priority)
            .bind(data.status)
            .bind(data.start_date)
            .bind(data.due_date)
            .bind(data.created_by)
            .bind(now)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Single task with assignee and creator display names resolved
    pub async fn find_with_names(
        db: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<TaskWithNames>, sqlx::Error> {
        let sql = format!("{SELECT_WITH_NAMES} WHERE t.id = $1");

        sqlx::query_as::<_, TaskWithNames>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// One page of tasks matching the selector, with names resolved.
    ///
    /// `limit` and `offset` are taken as-is; the query engine is
    /// responsible for clamping them to sane bounds.
    pub async fn list_page(
        db: impl PgExecutor<'_>,
        selector: AssigneeSelector,
        sort_by: TaskSortKey,
        sort_dir: SortDirection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskWithNames>, sqlx::Error> {
        let order = order_clause(sort_by, sort_dir);

        match selector {
            AssigneeSelector::Any => {
                let sql =
                    format!("{SELECT_WITH_NAMES} ORDER BY {order} LIMIT $1 OFFSET $2");
                sqlx::query_as::<_, TaskWithNames>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(db)
                    .await
            }
            AssigneeSelector::Unassigned => {
                let sql = format!(
                    "{SELECT_WITH_NAMES} WHERE t.assigned_to IS NULL \
                     ORDER BY {order} LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, TaskWithNames>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(db)
                    .await
            }
            AssigneeSelector::User(user_id) => {
                let sql = format!(
                    "{SELECT_WITH_NAMES} WHERE t.assigned_to = $1 \
                     ORDER BY {order} LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, TaskWithNames>(&sql)
                    .bind(user_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(db)
                    .await
            }
        }
    }

    /// Total number of tasks matching the selector
    pub async fn count_matching(
        db: impl PgExecutor<'_>,
        selector: AssigneeSelector,
    ) -> Result<i64, sqlx::Error> {
        match selector {
            AssigneeSelector::Any => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
                    .fetch_one(db)
                    .await
            }
            AssigneeSelector::Unassigned => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM tasks WHERE assigned_to IS NULL",
                )
                .fetch_one(db)
                .await
            }
            AssigneeSelector::User(user_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM tasks WHERE assigned_to = $1",
                )
                .bind(user_id)
                .fetch_one(db)
                .await
            }
        }
    }

    /// Applies a partial update and returns the updated row, or `None`
    /// if the task does not exist. Always bumps `updated_at`, matching
    /// how edits are surfaced in "recently changed" ordering.
    pub async fn update(
        db: impl PgExecutor<'_>,
        id: Uuid,
        changes: UpdateTask,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut bind = 2;

        if changes.title.is_some() {
            sets.push(format!("title = ${bind}"));
            bind += 1;
        }
        if changes.description.is_some() {
            sets.push(format!("description = ${bind}"));
            bind += 1;
        }
        if changes.assigned_to.is_some() {
            sets.push(format!("assigned_to = ${bind}"));
            bind += 1;
        }
        if changes.priority.is_some() {
            sets.push(format!("priority = ${bind}"));
            bind += 1;
        }
        if changes.status.is_some() {
            sets.push(format!("status = ${bind}"));
            bind += 1;
        }
        if changes.start_date.is_some() {
            sets.push(format!("start_date = ${bind}"));
            bind += 1;
        }
        if changes.due_date.is_some() {
            sets.push(format!("due_date = ${bind}"));
            bind += 1;
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ${} RETURNING {TASK_COLUMNS}",
            sets.join(", "),
            bind
        );

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(now);
        if let Some(title) = changes.title {
            query = query.bind(title);
        }
        if let Some(description) = changes.description {
            query = query.bind(description);
        }
        if let Some(assigned_to) = changes.assigned_to {
            query = query.bind(assigned_to);
        }
        if let Some(priority) = changes.priority {
            query = query.bind(priority);
        }
        if let Some(status) = changes.status {
            query = query.bind(status);
        }
        if let Some(start_date) = changes.start_date {
            query = query.bind(start_date);
        }
        if let Some(due_date) = changes.due_date {
            query = query.bind(due_date);
        }

        query.bind(id).fetch_optional(db).await
    }

    /// Sets the status and bumps `updated_at`
    pub async fn set_status(
        db: impl PgExecutor<'_>,
        id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks SET status = $1, updated_at = $2 WHERE id = $3 \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(status)
            .bind(now)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Deletes a task; comments go with it via `ON DELETE CASCADE`.
    /// Returns `false` if no row matched.
    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Dashboard aggregates over the tasks matching the selector.
    ///
    /// "Overdue" means due strictly before `today` and not completed.
    pub async fn status_counts(
        db: impl PgExecutor<'_>,
        selector: AssigneeSelector,
        today: NaiveDate,
    ) -> Result<StatusCounts, sqlx::Error> {
        const AGGREGATES: &str = "COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE status = 'completed') AS completed, \
             COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
             COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress, \
             COUNT(*) FILTER (WHERE due_date < $1 AND status <> 'completed') AS overdue";

        match selector {
            AssigneeSelector::Any => {
                let sql = format!("SELECT {AGGREGATES} FROM tasks");
                sqlx::query_as::<_, StatusCounts>(&sql)
                    .bind(today)
                    .fetch_one(db)
                    .await
            }
            AssigneeSelector::Unassigned => {
                let sql =
                    format!("SELECT {AGGREGATES} FROM tasks WHERE assigned_to IS NULL");
                sqlx::query_as::<_, StatusCounts>(&sql)
                    .bind(today)
                    .fetch_one(db)
                    .await
            }
            AssigneeSelector::User(user_id) => {
                let sql =
                    format!("SELECT {AGGREGATES} FROM tasks WHERE assigned_to = $2");
                sqlx::query_as::<_, StatusCounts>(&sql)
                    .bind(today)
                    .bind(user_id)
                    .fetch_one(db)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::OnHold).unwrap(),
            "\"On Hold\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"Pending\"").unwrap(),
            TaskStatus::Pending
        );
    }

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("in progress"), None);
        assert_eq!(TaskStatus::parse("Done"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_priority_wire_names() {
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "\"High\"");
        assert_eq!(
            serde_json::from_str::<TaskPriority>("\"Medium\"").unwrap(),
            TaskPriority::Medium
        );
        assert!(serde_json::from_str::<TaskPriority>("\"medium\"").is_err());
    }

    #[test]
    fn test_sort_key_falls_back_to_created_at() {
        assert_eq!(TaskSortKey::from_param("due_date"), TaskSortKey::DueDate);
        assert_eq!(TaskSortKey::from_param("status"), TaskSortKey::Status);
        assert_eq!(TaskSortKey::from_param("priority"), TaskSortKey::CreatedAt);
        assert_eq!(TaskSortKey::from_param(""), TaskSortKey::CreatedAt);
    }

    #[test]
    fn test_sort_direction_falls_back_to_desc() {
        assert_eq!(SortDirection::from_param("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("upward"), SortDirection::Desc);
    }

    #[test]
    fn test_assignee_selector_from_param() {
        let id = Uuid::new_v4();
        assert_eq!(
            AssigneeSelector::from_param(&id.to_string()),
            AssigneeSelector::User(id)
        );
        assert_eq!(
            AssigneeSelector::from_param("unassigned"),
            AssigneeSelector::Unassigned
        );
        assert_eq!(AssigneeSelector::from_param("42"), AssigneeSelector::Any);
        assert_eq!(AssigneeSelector::from_param(""), AssigneeSelector::Any);
    }

    #[test]
    fn test_order_clause_shapes() {
        assert_eq!(
            order_clause(TaskSortKey::CreatedAt, SortDirection::Desc),
            "t.created_at DESC"
        );
        assert_eq!(
            order_clause(TaskSortKey::DueDate, SortDirection::Asc),
            "t.due_date ASC NULLS LAST"
        );

        let status_order = order_clause(TaskSortKey::Status, SortDirection::Asc);
        assert!(status_order.contains("WHEN 'pending' THEN 1"));
        assert!(status_order.contains("WHEN 'completed' THEN 4"));
        assert!(status_order.ends_with("t.updated_at DESC"));
    }
}
