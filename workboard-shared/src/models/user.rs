/// User model and data access
///
/// Users are the identity store for Workboard. Every actor is either an
/// `admin` or a `developer`; the role decides what the authorization
/// policy lets them do. Emails are stored normalized (trimmed, lowercased)
/// and are unique on that normalized form.
///
/// # Database Schema
///
/// ```text
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     role user_role NOT NULL DEFAULT 'developer',
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use workboard_shared::models::user::{CreateUser, Role, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Alice".to_string(),
///         email: "alice@example.com".to_string(),
///         role: Role::Developer,
///         password_hash: "$argon2id$...".to_string(),
///     },
///     chrono::Utc::now(),
/// )
/// .await?;
///
/// assert_eq!(user.role, Role::Developer);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// User role, mirrors the `user_role` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Developer => "developer",
        }
    }

    /// Parses a role from request input. Case-insensitive; anything other
    /// than the two known roles is rejected.
    pub fn parse(input: &str) -> Option<Role> {
        match input.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "developer" => Some(Role::Developer),
            _ => None,
        }
    }
}

/// User database record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Display name shown on tasks and in the user directory
    pub name: String,

    /// Normalized (trimmed, lowercased) email, unique
    pub email: String,

    pub role: Role,

    /// Argon2id hash in PHC string format, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a user. The caller validates and normalizes the
/// fields and hashes the password before this reaches the database.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

/// Partial update for a user; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }
}

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";

impl User {
    /// Inserts a new user and returns the stored row
    pub async fn create(
        db: impl PgExecutor<'_>,
        data: CreateUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (name, email, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.name)
            .bind(data.email)
            .bind(data.role)
            .bind(data.password_hash)
            .bind(created_at)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Looks up a user by normalized email (the caller normalizes)
    pub async fn find_by_email(
        db: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// All users, newest first (the admin user directory)
    pub async fn list(db: impl PgExecutor<'_>) -> Result<Vec<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");

        sqlx::query_as::<_, User>(&sql).fetch_all(db).await
    }

    pub async fn count(db: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await
    }

    /// Checks whether an email is already taken, optionally excluding one
    /// user id (the user being updated).
    pub async fn email_taken(
        db: impl PgExecutor<'_>,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let existing: Option<Uuid> = match exclude {
            Some(id) => {
                sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id <> $2")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(db)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(db)
                    .await?
            }
        };

        Ok(existing.is_some())
    }

    /// Row-locks every admin and returns their ids.
    ///
    /// Must run inside a transaction. The `ORDER BY id` makes concurrent
    /// callers acquire the locks in the same order, so two admin-guard
    /// transactions serialize instead of deadlocking.
    pub async fn admin_ids_for_update(
        db: impl PgExecutor<'_>,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(db)
        .await
    }

    /// Applies a partial update and returns the updated row, or `None` if
    /// the user does not exist. An empty update reads the current row.
    pub async fn update(
        db: impl PgExecutor<'_>,
        id: Uuid,
        changes: UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        if changes.is_empty() {
            return Self::find_by_id(db, id).await;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut bind = 1;

        if changes.name.is_some() {
            sets.push(format!("name = ${bind}"));
            bind += 1;
        }
        if changes.email.is_some() {
            sets.push(format!("email = ${bind}"));
            bind += 1;
        }
        if changes.role.is_some() {
            sets.push(format!("role = ${bind}"));
            bind += 1;
        }
        if changes.password_hash.is_some() {
            sets.push(format!("password_hash = ${bind}"));
            bind += 1;
        }

        let sql = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING {USER_COLUMNS}",
            sets.join(", "),
            bind
        );

        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(name) = changes.name {
            query = query.bind(name);
        }
        if let Some(email) = changes.email {
            query = query.bind(email);
        }
        if let Some(role) = changes.role {
            query = query.bind(role);
        }
        if let Some(password_hash) = changes.password_hash {
            query = query.bind(password_hash);
        }

        query.bind(id).fetch_optional(db).await
    }

    /// Deletes a user; returns `false` if no row matched. Tasks and
    /// comments referencing the user keep their rows with the reference
    /// set to NULL by the schema.
    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("Developer"), Some(Role::Developer));
        assert_eq!(Role::parse("manager"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"developer\"").unwrap(),
            Role::Developer
        );
        assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Admin,
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());
        assert!(!UpdateUser {
            name: Some("Bob".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
