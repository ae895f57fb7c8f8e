use crate::{app::AppState, error::ApiError};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workboard_shared::auth::jwt::{self, Claims};
use workboard_shared::projection::UserView;

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(max = 255, message = "Email must not exceed 255 characters"))]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response with JWT token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserView,
}

/// Authenticates a user and issues a JWT
///
/// # Endpoint
///
/// `POST /v1/auth/login`
///
/// # Request Body
///
/// ```json
/// {
///   "email": "admin@example.com",
///   "password": "changeme"
/// }
/// ```
///
/// # Response
///
/// Returns the access token and the authenticated user:
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "user": { "id": "...", "name": "...", "email": "...", "role": "admin" }
/// }
/// ```
///
/// # Errors
///
/// - 400 if email or password is missing
/// - 401 if the credentials do not match a user
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()?;

    let user = state
        .users
        .authenticate(
            req.email.as_deref().unwrap_or(""),
            req.password.as_deref().unwrap_or(""),
        )
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let claims = Claims::new(user.id);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        access_token,
        user: UserView::from(user),
    }))
}
