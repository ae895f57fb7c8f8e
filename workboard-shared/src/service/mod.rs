/// Mutation services
///
/// The write side of Workboard. Each service validates its input, asks the
/// authorization policy for a decision, then applies the change through the
/// model layer. Services are constructed with their dependencies (pool,
/// clock, credential hasher) and are cheap to clone.
///
/// - [`tasks`]: task create/update/delete, status changes, comments
/// - [`users`]: user management with the last-admin guard, login check
pub mod tasks;
pub mod users;

pub use tasks::{TaskDraft, TaskPatch, TaskService};
pub use users::{UserDraft, UserPatch, UserService};

use crate::error::CoreError;

/// True when the error is a Postgres violation of the named constraint.
///
/// Used to map races the pre-checks cannot close: a comment insert losing
/// to a task delete, or a user insert losing to a duplicate email.
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

/// Wraps a credential-hasher failure as an internal error; hashing does
/// not fail on user input, so there is nothing for the caller to fix.
fn hash_failure(err: crate::auth::password::PasswordError) -> CoreError {
    CoreError::Internal(format!("password hashing failed: {err}"))
}
