/// Read shapes returned to callers
///
/// Projections are pure: they assemble the view from rows already read,
/// never fetch anything themselves, and take `today` as an argument so
/// the overdue flag is a function of its inputs. Display names come from
/// the LEFT JOINs in the task queries; a dangling reference projects as
/// null, never as an error.
use crate::models::comment::Comment;
use crate::models::task::{TaskPriority, TaskStatus, TaskWithNames};
use crate::models::user::{Role, User};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task as seen by API clients
///
/// Dates serialize as `YYYY-MM-DD`, timestamps as RFC 3339 instants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
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

    /// Due strictly before `today` and not completed. A task with no due
    /// date is never overdue.
    pub is_overdue: bool,
}

impl TaskView {
    pub fn project(record: TaskWithNames, today: NaiveDate) -> TaskView {
        let is_overdue = is_overdue(record.due_date, record.status, today);

        TaskView {
            id: record.id,
            title: record.title,
            description: record.description,
            assigned_to: record.assigned_to,
            assigned_to_name: record.assigned_to_name,
            priority: record.priority,
            status: record.status,
            start_date: record.start_date,
            due_date: record.due_date,
            created_by: record.created_by,
            created_by_name: record.created_by_name,
            created_at: record.created_at,
            updated_at: record.updated_at,
            is_overdue,
        }
    }
}

fn is_overdue(due_date: Option<NaiveDate>, status: TaskStatus, today: NaiveDate) -> bool {
    match due_date {
        Some(due) => status != TaskStatus::Completed && due < today,
        None => false,
    }
}

/// User as seen by API clients; no credential material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Comment as seen by API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Null when the author has since been deleted
    pub user_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        CommentView {
            id: comment.id,
            task_id: comment.task_id,
            user_id: comment.user_id,
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}
