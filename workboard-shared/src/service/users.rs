/// User management service
///
/// Admin-only CRUD over user accounts plus the login credential check.
/// Holds the credential hasher as an injected capability so the hash
/// format never leaks into this layer.
///
/// The at-least-one-admin invariant is enforced transactionally: before
/// demoting or deleting an admin, the service row-locks every admin
/// (`SELECT ... FOR UPDATE`) and counts them under the lock. Two
/// concurrent "remove the other admin" requests therefore serialize,
/// and the second one fails with a conflict instead of leaving zero
/// admins behind.
use crate::auth::password::CredentialHasher;
use crate::auth::policy::{self, Actor};
use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::models::user::{CreateUser, Role, UpdateUser, User};
use crate::projection::UserView;
use crate::validate::{is_valid_email, normalize_email};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::{hash_failure, violates};

const PASSWORD_MIN_CHARS: usize = 6;

/// Raw input for creating a user
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to developer when absent
    pub role: Option<String>,
}

/// Raw partial update for a user; absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

fn check_password_length(password: &str) -> CoreResult<()> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(CoreError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// Write-side service for user accounts
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    clock: Arc<dyn Clock>,
    credentials: Arc<dyn CredentialHasher>,
}

impl UserService {
    pub fn new(db: PgPool, clock: Arc<dyn Clock>, credentials: Arc<dyn CredentialHasher>) -> Self {
        Self {
            db,
            clock,
            credentials,
        }
    }

    /// The user directory, newest first. Admin only.
    pub async fn list_users(&self, actor: &Actor) -> CoreResult<Vec<UserView>> {
        policy::require_admin(actor)?;

        let users = User::list(&self.db).await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    /// Creates a user. Admin only. The email is stored trimmed and
    /// lowercased; uniqueness is checked against that normalized form.
    pub async fn create_user(&self, actor: &Actor, draft: UserDraft) -> CoreResult<UserView> {
        policy::require_admin(actor)?;

        let name = draft.name.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() {
            return Err(CoreError::Validation("Name is required".to_string()));
        }

        let email = normalize_email(draft.email.as_deref().unwrap_or(""));
        if email.is_empty() {
            return Err(CoreError::Validation("Email is required".to_string()));
        }
        if !is_valid_email(&email) {
            return Err(CoreError::Validation("Invalid email format".to_string()));
        }

        let password = draft.password.as_deref().unwrap_or("");
        check_password_length(password)?;

        let role = match draft.role.as_deref() {
            Some(raw) => Role::parse(raw).ok_or_else(|| {
                CoreError::Validation("Invalid role. Must be admin or developer".to_string())
            })?,
            None => Role::Developer,
        };

        if User::email_taken(&self.db, &email, None).await? {
            return Err(CoreError::Conflict("Email already exists".to_string()));
        }

        let password_hash = self.credentials.hash(password).map_err(hash_failure)?;

        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                email,
                role,
                password_hash,
            },
            self.clock.now(),
        )
        .await
        .map_err(|err| {
            // Insert lost the race against a concurrent signup
            if violates(&err, "users_email_key") {
                CoreError::Conflict("Email already exists".to_string())
            } else {
                err.into()
            }
        })?;

        tracing::info!(
            user_id = %user.id,
            role = user.role.as_str(),
            created_by = %actor.id,
            "user created"
        );

        Ok(UserView::from(user))
    }

    /// Applies a partial update. Admin only. Email changes re-validate
    /// format and uniqueness; a role change away from admin is refused
    /// when it would leave zero admins.
    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        patch: UserPatch,
    ) -> CoreResult<UserView> {
        policy::require_admin(actor)?;

        let mut tx = self.db.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(CoreError::NotFound("User"))?;

        let mut changes = UpdateUser::default();

        if let Some(name) = patch.name.as_deref() {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::Validation("Name is required".to_string()));
            }
            changes.name = Some(name.to_string());
        }

        if let Some(raw) = patch.email.as_deref() {
            let email = normalize_email(raw);
            if !is_valid_email(&email) {
                return Err(CoreError::Validation("Invalid email format".to_string()));
            }
            if User::email_taken(&mut *tx, &email, Some(user_id)).await? {
                return Err(CoreError::Conflict("Email already exists".to_string()));
            }
            changes.email = Some(email);
        }

        if let Some(raw) = patch.role.as_deref() {
            let role =
                Role::parse(raw).ok_or_else(|| CoreError::Validation("Invalid role".to_string()))?;
            if user.role == Role::Admin && role == Role::Developer {
                let admins = User::admin_ids_for_update(&mut *tx).await?;
                if admins.len() <= 1 {
                    return Err(CoreError::Conflict(
                        "Cannot change role. At least one admin is required".to_string(),
                    ));
                }
            }
            changes.role = Some(role);
        }

        if let Some(password) = patch.password.as_deref() {
            check_password_length(password)?;
            let hash = self.credentials.hash(password).map_err(hash_failure)?;
            changes.password_hash = Some(hash);
        }

        let updated = User::update(&mut *tx, user_id, changes)
            .await
            .map_err(|err| {
                if violates(&err, "users_email_key") {
                    CoreError::Conflict("Email already exists".to_string())
                } else {
                    err.into()
                }
            })?
            .ok_or(CoreError::NotFound("User"))?;

        tx.commit().await?;

        tracing::info!(user_id = %updated.id, updated_by = %actor.id, "user updated");

        Ok(UserView::from(updated))
    }

    /// Deletes a user. Admin only; self-deletion and deleting the last
    /// admin are refused. Tasks and comments that reference the user
    /// keep existing with the reference set to null.
    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid) -> CoreResult<()> {
        policy::require_admin(actor)?;

        let mut tx = self.db.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(CoreError::NotFound("User"))?;

        if user.id == actor.id {
            return Err(CoreError::Forbidden(
                "Cannot delete your own account".to_string(),
            ));
        }

        if user.role == Role::Admin {
            let admins = User::admin_ids_for_update(&mut *tx).await?;
            if admins.len() <= 1 {
                return Err(CoreError::Conflict(
                    "Cannot delete the last admin".to_string(),
                ));
            }
        }

        if !User::delete(&mut *tx, user_id).await? {
            return Err(CoreError::NotFound("User"));
        }

        tx.commit().await?;

        tracing::info!(user_id = %user_id, deleted_by = %actor.id, "user deleted");

        Ok(())
    }

    /// Checks a login attempt against the stored credentials.
    ///
    /// Returns `Ok(None)` for an unknown email or a wrong password; the
    /// caller surfaces both identically. Missing input is a validation
    /// error, matching how the login form reports it.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<Option<User>> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = match User::find_by_email(&self.db, &email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let valid = self
            .credentials
            .verify(password, &user.password_hash)
            .map_err(|err| CoreError::Internal(format!("password verification failed: {err}")))?;

        if valid {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
