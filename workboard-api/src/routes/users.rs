use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use workboard_shared::auth::Actor;
use workboard_shared::projection::UserView;
use workboard_shared::service::{UserDraft, UserPatch};

/// User creation request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    #[validate(length(max = 255, message = "Name must not exceed 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Email must not exceed 255 characters"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl CreateUserRequest {
    fn into_draft(self) -> UserDraft {
        UserDraft {
            name: self.name,
            email: self.email,
            password: self.password,
            role: self.role,
        }
    }
}

/// User update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(max = 255, message = "Name must not exceed 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Email must not exceed 255 characters"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    fn into_patch(self) -> UserPatch {
        UserPatch {
            name: self.name,
            email: self.email,
            role: self.role,
            password: self.password,
        }
    }
}

/// Lists all users, newest first
///
/// # Endpoint
///
/// `GET /v1/users`
///
/// # Errors
///
/// - 403 when the caller is not an admin
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.users.list_users(&actor).await?;
    Ok(Json(users))
}

/// Creates a new user account
///
/// # Endpoint
///
/// `POST /v1/users`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Dana Developer",
///   "email": "dana@example.com",
///   "password": "secret1",
///   "role": "developer"
/// }
/// ```
///
/// Role defaults to `developer` when absent.
///
/// # Errors
///
/// - 400 on a missing name or email, a malformed email, a password
///   shorter than six characters, or an unknown role
/// - 403 when the caller is not an admin
/// - 409 when the email is already registered
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    req.validate()?;

    let user = state.users.create_user(&actor, req.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Partially updates a user account
///
/// # Endpoint
///
/// `PUT /v1/users/{id}`
///
/// # Errors
///
/// - 400 on invalid field values
/// - 403 when the caller is not an admin
/// - 404 when the user does not exist
/// - 409 on a duplicate email, or when the change would demote the
///   last remaining admin
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    req.validate()?;

    let user = state
        .users
        .update_user(&actor, user_id, req.into_patch())
        .await?;
    Ok(Json(user))
}

/// Deletes a user account
///
/// Task and comment references to the deleted user become null; the
/// records themselves survive.
///
/// # Endpoint
///
/// `DELETE /v1/users/{id}`
///
/// # Errors
///
/// - 403 when the caller is not an admin, or tries to delete their own
///   account
/// - 404 when the user does not exist
/// - 409 when the target is the last remaining admin
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(&actor, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
