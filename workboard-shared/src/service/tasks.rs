/// Task mutation service
///
/// Validates raw request input (vocabulary words, `YYYY-MM-DD` date
/// strings), applies the authorization policy, and writes through the
/// task model. Success responses are returned as read projections so
/// callers see exactly what a subsequent fetch would return.
///
/// Field rules:
///
/// - Title must be non-empty after trimming.
/// - Priority and status must match the fixed vocabularies exactly.
/// - Dates are `YYYY-MM-DD` strings; an empty string behaves like null.
/// - Assigning to an unknown user id is reported as the user not being
///   found; the foreign key backstops the pre-check under races.
use crate::auth::policy::{self, Actor};
use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
use crate::models::user::User;
use crate::projection::{CommentView, TaskView};
use crate::validate::parse_date;
use chrono::NaiveDate;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::violates;

/// Raw input for creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
}

/// Raw partial update for a task.
///
/// Outer `None` = leave unchanged; for the nullable fields, `Some(None)`
/// = clear. Date strings are validated here, not at the deserialization
/// boundary, so the error messages can name the offending field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
}

fn parse_priority(value: Option<&str>) -> CoreResult<Option<TaskPriority>> {
    match value {
        None => Ok(None),
        Some(raw) => TaskPriority::parse(raw)
            .map(Some)
            .ok_or_else(|| CoreError::Validation("Invalid priority".to_string())),
    }
}

fn parse_status(value: Option<&str>) -> CoreResult<Option<TaskStatus>> {
    match value {
        None => Ok(None),
        Some(raw) => TaskStatus::parse(raw)
            .map(Some)
            .ok_or_else(|| CoreError::Validation("Invalid status".to_string())),
    }
}

/// An absent or empty date string is "no date"; anything else must parse
fn parse_optional_date(field: &str, value: Option<&str>) -> CoreResult<Option<NaiveDate>> {
    match value {
        Some(raw) if !raw.is_empty() => parse_date(field, raw).map(Some),
        _ => Ok(None),
    }
}

fn patch_date(
    field: &str,
    value: Option<Option<String>>,
) -> CoreResult<Option<Option<NaiveDate>>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_optional_date(field, raw.as_deref()).map(Some),
    }
}

async fn ensure_user_exists(db: &PgPool, id: Uuid) -> CoreResult<()> {
    match User::find_by_id(db, id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound("User")),
    }
}

/// Write-side service for tasks and their comments
#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Creates a task. Admin only; the actor becomes the creator.
    pub async fn create_task(&self, actor: &Actor, draft: TaskDraft) -> CoreResult<TaskView> {
        policy::require_admin(actor)?;

        let title = match draft.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(CoreError::Validation("Title is required".to_string())),
        };

        let priority = parse_priority(draft.priority.as_deref())?.unwrap_or(TaskPriority::Medium);
        let status = parse_status(draft.status.as_deref())?.unwrap_or(TaskStatus::Pending);
        let start_date = parse_optional_date("start_date", draft.start_date.as_deref())?;
        let due_date = parse_optional_date("due_date", draft.due_date.as_deref())?;

        if let Some(assignee) = draft.assigned_to {
            ensure_user_exists(&self.db, assignee).await?;
        }

        let task = Task::create(
            &self.db,
            CreateTask {
                title,
                description: draft.description,
                assigned_to: draft.assigned_to,
                priority,
                status,
                start_date,
                due_date,
                created_by: actor.id,
            },
            self.clock.now(),
        )
        .await
        .map_err(|err| {
            if violates(&err, "tasks_assigned_to_fkey") {
                CoreError::NotFound("User")
            } else {
                err.into()
            }
        })?;

        tracing::info!(task_id = %task.id, created_by = %actor.id, "task created");

        self.view(task.id).await
    }

    /// Applies a partial update. Admins may touch any field; the assigned
    /// developer any field except the assignee.
    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> CoreResult<TaskView> {
        let task = Task::find_by_id(&self.db, task_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;
        policy::require_task_access(actor, &task)?;

        if patch.assigned_to.is_some() && !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "Only admin can reassign tasks".to_string(),
            ));
        }

        let mut changes = UpdateTask::default();

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(CoreError::Validation("Title is required".to_string()));
            }
            changes.title = Some(title);
        }
        changes.description = patch.description;
        if let Some(assignee) = patch.assigned_to {
            if let Some(id) = assignee {
                ensure_user_exists(&self.db, id).await?;
            }
            changes.assigned_to = Some(assignee);
        }
        changes.priority = parse_priority(patch.priority.as_deref())?;
        changes.status = parse_status(patch.status.as_deref())?;
        changes.start_date = patch_date("start_date", patch.start_date)?;
        changes.due_date = patch_date("due_date", patch.due_date)?;

        let updated = Task::update(&self.db, task_id, changes, self.clock.now())
            .await
            .map_err(|err| {
                if violates(&err, "tasks_assigned_to_fkey") {
                    CoreError::NotFound("User")
                } else {
                    err.into()
                }
            })?
            .ok_or(CoreError::NotFound("Task"))?;

        tracing::info!(task_id = %updated.id, user_id = %actor.id, "task updated");

        self.view(updated.id).await
    }

    /// Status-only update. Same access rule as a general update; the new
    /// value must be one of the four vocabulary words.
    pub async fn update_status(
        &self,
        actor: &Actor,
        task_id: Uuid,
        status: Option<String>,
    ) -> CoreResult<TaskView> {
        let task = Task::find_by_id(&self.db, task_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;
        policy::require_task_access(actor, &task)?;

        let raw = status.unwrap_or_default();
        if raw.is_empty() {
            return Err(CoreError::Validation("Status is required".to_string()));
        }
        let parsed = TaskStatus::parse(&raw)
            .ok_or_else(|| CoreError::Validation("Invalid status".to_string()))?;

        let updated = Task::set_status(&self.db, task_id, parsed, self.clock.now())
            .await?
            .ok_or(CoreError::NotFound("Task"))?;

        tracing::info!(task_id = %updated.id, status = parsed.as_str(), "task status changed");

        self.view(updated.id).await
    }

    /// Deletes a task and, through the cascade, its comments. Admin only.
    pub async fn delete_task(&self, actor: &Actor, task_id: Uuid) -> CoreResult<()> {
        policy::require_admin(actor)?;

        if !Task::delete(&self.db, task_id).await? {
            return Err(CoreError::NotFound("Task"));
        }

        tracing::info!(task_id = %task_id, deleted_by = %actor.id, "task deleted");

        Ok(())
    }

    /// Adds a comment authored by the actor. The body is stored trimmed.
    pub async fn add_comment(
        &self,
        actor: &Actor,
        task_id: Uuid,
        body: Option<String>,
    ) -> CoreResult<CommentView> {
        let task = Task::find_by_id(&self.db, task_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;
        policy::require_task_access(actor, &task)?;

        let body = body.unwrap_or_default().trim().to_string();
        if body.is_empty() {
            return Err(CoreError::Validation("Comment text is required".to_string()));
        }

        let comment = Comment::create(
            &self.db,
            CreateComment {
                task_id,
                user_id: actor.id,
                body,
            },
            self.clock.now(),
        )
        .await
        .map_err(|err| {
            // Insert lost the race against a task delete
            if violates(&err, "comments_task_id_fkey") {
                CoreError::NotFound("Task")
            } else {
                err.into()
            }
        })?;

        Ok(CommentView::from(comment))
    }

    async fn view(&self, task_id: Uuid) -> CoreResult<TaskView> {
        let record = Task::find_with_names(&self.db, task_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;
        Ok(TaskView::project(record, self.clock.today()))
    }
}
