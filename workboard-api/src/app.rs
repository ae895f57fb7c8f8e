/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use workboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = workboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workboard_shared::auth::jwt;
use workboard_shared::auth::password::Argon2Hasher;
use workboard_shared::auth::Actor;
use workboard_shared::clock::{Clock, SystemClock};
use workboard_shared::models::user::User;
use workboard_shared::query::TaskQueries;
use workboard_shared::service::{TaskService, UserService};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// The services share the pool and the production capabilities (system
/// clock, argon2 hasher) wired in here; everything is Arc-backed and
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Read side: task listings, comments, dashboard
    pub queries: TaskQueries,

    /// Write side: task mutations
    pub tasks: TaskService,

    /// User management and login checks
    pub users: UserService,
}

impl AppState {
    /// Creates new application state with production capabilities
    pub fn new(db: PgPool, config: Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Self {
            queries: TaskQueries::new(db.clone(), clock.clone()),
            tasks: TaskService::new(db.clone(), clock.clone()),
            users: UserService::new(db.clone(), clock, Arc::new(Argon2Hasher)),
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// └── /v1/                       # API v1 (versioned)
///     ├── /auth/
///     │   └── POST /login        # Email + password, returns a JWT
///     ├── /tasks/                # Authenticated
///     │   ├── GET    /           # List (paginated, sorted, filtered)
///     │   ├── POST   /           # Create (admin)
///     │   ├── PUT    /:id        # Partial update
///     │   ├── DELETE /:id        # Delete (admin)
///     │   ├── PUT    /:id/status # Status-only update
///     │   └── GET/POST /:id/comments
///     ├── /dashboard/
///     │   └── GET /stats         # Role-scoped counts
///     └── /users/                # Admin only (enforced per handler)
///         ├── GET    /
///         ├── POST   /
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group JWT layer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new().route("/login", post(routes::auth::login));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/status", put(routes::tasks::update_status))
        .route("/:id/comments", get(routes::tasks::list_comments))
        .route("/:id/comments", post(routes::tasks::add_comment))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let dashboard_routes = Router::new()
        .route("/stats", get(routes::tasks::dashboard_stats))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // User management; the admin requirement lives in the service layer
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/", post(routes::users::create_user))
        .route("/:id", put(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/users", user_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token, re-reads the user row (so a
/// deleted account or a changed role takes effect on the next request,
/// not at token expiry), and injects the [`Actor`] into request
/// extensions for handlers to consume.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    // Validate token
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    // Resolve the actor against the current user record
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Unknown user".to_string()))?;

    req.extensions_mut().insert(Actor::new(user.id, user.role));

    Ok(next.run(req).await)
}
