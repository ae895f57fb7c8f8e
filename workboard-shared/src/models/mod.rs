//! Database models
//!
//! Each model owns its SQL. Functions take `impl PgExecutor<'_>` so the
//! same query runs against the pool or inside a transaction; the services
//! decide the transaction boundary.

pub mod comment;
pub mod task;
pub mod user;

pub use comment::{Comment, CreateComment};
pub use task::{
    AssigneeSelector, CreateTask, SortDirection, StatusCounts, Task, TaskPriority, TaskSortKey,
    TaskStatus, TaskWithNames, UpdateTask,
};
pub use user::{CreateUser, Role, UpdateUser, User};
