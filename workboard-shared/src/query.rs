/// Task query engine
///
/// The read side of Workboard: filtered, sorted, paginated task listings,
/// comment listings, and the dashboard aggregates. All reads are scoped
/// before they touch the store: admins see every task, developers only
/// tasks assigned to them, and a developer's scope always wins over any
/// requested filter.
///
/// Out-of-range paging input is coerced here rather than rejected: page
/// is floored at 1 and per_page clamped to 1..=50, whatever the caller
/// sends. The returned meta block always describes the coerced values.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use workboard_shared::auth::Actor;
/// use workboard_shared::clock::SystemClock;
/// use workboard_shared::models::user::Role;
/// use workboard_shared::query::{TaskListParams, TaskQueries};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queries = TaskQueries::new(pool, Arc::new(SystemClock));
/// let admin = Actor::new(Uuid::new_v4(), Role::Admin);
///
/// let page = queries.list_tasks(&admin, TaskListParams::default()).await?;
/// println!("{} of {} tasks", page.tasks.len(), page.meta.total_items);
/// # Ok(())
/// # }
/// ```
use crate::auth::policy::{self, Actor};
use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::models::comment::Comment;
use crate::models::task::{AssigneeSelector, SortDirection, Task, TaskSortKey};
use crate::projection::{CommentView, TaskView};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Page size applied when the caller does not send one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on page size; larger requests are clamped, not rejected
pub const MAX_PAGE_SIZE: i64 = 50;

/// Listing parameters after request-level coercion.
///
/// Values may still be out of range (page 0, per_page 500); the engine
/// clamps them so the bounds hold for every caller, not just HTTP.
#[derive(Debug, Clone, Copy)]
pub struct TaskListParams {
    pub page: i64,
    pub per_page: i64,
    pub sort_by: TaskSortKey,
    pub sort_dir: SortDirection,
    /// Requested filter; only honored for admins
    pub assignee: AssigneeSelector,
}

impl Default for TaskListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            sort_by: TaskSortKey::CreatedAt,
            sort_dir: SortDirection::Desc,
            assignee: AssigneeSelector::Any,
        }
    }
}

/// Pagination envelope returned with every task listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(page: i64, per_page: i64, total_items: i64) -> PageMeta {
        let total_pages = (total_items + per_page - 1) / per_page;

        PageMeta {
            page,
            per_page,
            total_pages,
            total_items,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of projected tasks plus its meta block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskView>,
    pub meta: PageMeta,
}

/// Dashboard aggregates, scoped like any other read
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub overdue_tasks: i64,
}

/// Resolves the effective assignee restriction: a developer's own id
/// overrides whatever was requested.
fn scope_for(actor: &Actor, requested: AssigneeSelector) -> AssigneeSelector {
    if actor.is_admin() {
        requested
    } else {
        AssigneeSelector::User(actor.id)
    }
}

/// Read-side service over the task store
#[derive(Clone)]
pub struct TaskQueries {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

impl TaskQueries {
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Lists tasks visible to the actor
    pub async fn list_tasks(
        &self,
        actor: &Actor,
        params: TaskListParams,
    ) -> CoreResult<TaskPage> {
        let page = params.page.max(1);
        let per_page = params.per_page.clamp(1, MAX_PAGE_SIZE);
        let selector = scope_for(actor, params.assignee);

        let total_items = Task::count_matching(&self.db, selector).await?;

        let offset = (page - 1) * per_page;
        let records = Task::list_page(
            &self.db,
            selector,
            params.sort_by,
            params.sort_dir,
            per_page,
            offset,
        )
        .await?;

        let today = self.clock.today();
        let tasks = records
            .into_iter()
            .map(|record| TaskView::project(record, today))
            .collect();

        Ok(TaskPage {
            tasks,
            meta: PageMeta::new(page, per_page, total_items),
        })
    }

    /// Lists the comments on a task the actor can access, oldest first
    pub async fn list_comments(
        &self,
        actor: &Actor,
        task_id: Uuid,
    ) -> CoreResult<Vec<CommentView>> {
        let task = Task::find_by_id(&self.db, task_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;
        policy::require_task_access(actor, &task)?;

        let comments = Comment::list_for_task(&self.db, task_id).await?;
        Ok(comments.into_iter().map(CommentView::from).collect())
    }

    /// Status and overdue counts over the actor's visible tasks
    pub async fn dashboard_stats(&self, actor: &Actor) -> CoreResult<DashboardStats> {
        let selector = scope_for(actor, AssigneeSelector::Any);
        let counts = Task::status_counts(&self.db, selector, self.clock.today()).await?;

        Ok(DashboardStats {
            total_tasks: counts.total,
            completed_tasks: counts.completed,
            pending_tasks: counts.pending,
            in_progress_tasks: counts.in_progress,
            overdue_tasks: counts.overdue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    #[test]
    fn test_page_meta_partial_last_page() {
        let meta = PageMeta::new(1, 10, 25);

        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_items, 25);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_page_meta_exact_multiple() {
        let meta = PageMeta::new(3, 10, 30);

        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_page_meta_empty() {
        let meta = PageMeta::new(1, 10, 0);

        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_page_meta_beyond_last_page() {
        // Requesting past the end yields an empty page, not an error
        let meta = PageMeta::new(9, 10, 25);

        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_scope_admin_keeps_requested_filter() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        assert_eq!(
            scope_for(&admin, AssigneeSelector::Unassigned),
            AssigneeSelector::Unassigned
        );
        let other = Uuid::new_v4();
        assert_eq!(
            scope_for(&admin, AssigneeSelector::User(other)),
            AssigneeSelector::User(other)
        );
    }

    #[test]
    fn test_scope_developer_filter_is_overridden() {
        let dev = Actor::new(Uuid::new_v4(), Role::Developer);

        assert_eq!(
            scope_for(&dev, AssigneeSelector::Any),
            AssigneeSelector::User(dev.id)
        );
        // Even an explicit filter for someone else collapses to own tasks
        assert_eq!(
            scope_for(&dev, AssigneeSelector::User(Uuid::new_v4())),
            AssigneeSelector::User(dev.id)
        );
        assert_eq!(
            scope_for(&dev, AssigneeSelector::Unassigned),
            AssigneeSelector::User(dev.id)
        );
    }

    #[test]
    fn test_default_params() {
        let params = TaskListParams::default();

        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, DEFAULT_PAGE_SIZE);
        assert_eq!(params.sort_by, TaskSortKey::CreatedAt);
        assert_eq!(params.sort_dir, SortDirection::Desc);
        assert_eq!(params.assignee, AssigneeSelector::Any);
    }
}
