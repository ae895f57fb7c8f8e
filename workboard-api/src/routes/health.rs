use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Health check endpoint
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// Returns service status and database connectivity:
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
///
/// Reports `degraded` when the database probe fails; the endpoint
/// itself always answers 200 so load balancers can read the body.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match workboard_shared::db::health_check(&state.db).await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!("database health check failed: {}", err);
            "disconnected"
        }
    };

    let status = if database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}
