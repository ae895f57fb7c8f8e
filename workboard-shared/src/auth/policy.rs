/// Authorization policy
///
/// Pure decisions over an [`Actor`] (an authenticated user reduced to id
/// and role). The rules, in precedence order:
///
/// 1. Admins may do everything.
/// 2. Developers may read and modify only tasks currently assigned to
///    them, and may not create, delete, or reassign tasks.
/// 3. User management is admin-only.
///
/// Handlers never compare roles inline; every check goes through these
/// functions so the precedence stays in one place.
use crate::error::CoreError;
use crate::models::task::Task;
use crate::models::user::Role;
use uuid::Uuid;

/// The authenticated principal of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Gate for admin-only operations (task create/delete, user management)
pub fn require_admin(actor: &Actor) -> Result<(), CoreError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin access required".to_string()))
    }
}

/// Gate for operations on a specific task: admins always pass, developers
/// only when the task is currently assigned to them. An unassigned task
/// is reachable only by admins.
pub fn require_task_access(actor: &Actor, task: &Task) -> Result<(), CoreError> {
    if actor.is_admin() || task.assigned_to == Some(actor.id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Permission denied".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn task_assigned_to(assignee: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Fix the build".to_string(),
            description: None,
            assigned_to: assignee,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            start_date: None,
            due_date: None,
            created_by: Some(Uuid::new_v4()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let dev = Actor::new(Uuid::new_v4(), Role::Developer);

        assert!(require_admin(&admin).is_ok());

        let err = require_admin(&dev).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        assert_eq!(err.to_string(), "Admin access required");
    }

    #[test]
    fn test_admin_reaches_any_task() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        assert!(require_task_access(&admin, &task_assigned_to(None)).is_ok());
        assert!(require_task_access(&admin, &task_assigned_to(Some(Uuid::new_v4()))).is_ok());
    }

    #[test]
    fn test_developer_reaches_only_own_tasks() {
        let dev = Actor::new(Uuid::new_v4(), Role::Developer);

        assert!(require_task_access(&dev, &task_assigned_to(Some(dev.id))).is_ok());

        let err = require_task_access(&dev, &task_assigned_to(Some(Uuid::new_v4()))).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied");
    }

    #[test]
    fn test_developer_cannot_reach_unassigned_task() {
        let dev = Actor::new(Uuid::new_v4(), Role::Developer);

        assert!(require_task_access(&dev, &task_assigned_to(None)).is_err());
    }
}
