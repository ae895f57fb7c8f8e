/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations included)
/// - Test admin and developer accounts with known passwords
/// - JWT token generation
/// - Request helpers
///
/// Tests require `DATABASE_URL` to point at a disposable Postgres
/// database; when the variable is unset every test skips itself.
use axum::body::Body;
use axum::http::Request;
use sqlx::PgPool;
use uuid::Uuid;
use workboard_api::app::{build_router, AppState};
use workboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use workboard_shared::auth::jwt::{create_token, Claims};
use workboard_shared::auth::password::hash_password;
use workboard_shared::clock::{Clock, SystemClock};
use workboard_shared::models::user::{CreateUser, Role, User};

/// Password shared by every account a test context creates
pub const TEST_PASSWORD: &str = "password123";

/// Signing secret the test router is configured with
pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub admin: User,
    pub admin_token: String,
    pub developer: User,
    pub developer_token: String,
}

impl TestContext {
    /// Creates a new test context, or `None` when `DATABASE_URL` is
    /// not set.
    pub async fn new() -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL is not set; skipping integration test");
                return None;
            }
        };

        let db = PgPool::connect(&url)
            .await
            .expect("failed to connect to the test database");

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("migrations failed");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            bootstrap_admin: None,
        };

        let admin = create_test_user(&db, "Test Admin", Role::Admin).await;
        let developer = create_test_user(&db, "Test Developer", Role::Developer).await;

        let admin_token = mint_token(admin.id);
        let developer_token = mint_token(developer.id);

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            admin,
            admin_token,
            developer,
            developer_token,
        })
    }

    /// Authorization header value for the admin account
    pub fn admin_auth(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Authorization header value for the developer account
    pub fn developer_auth(&self) -> String {
        format!("Bearer {}", self.developer_token)
    }

    /// Cleans up test data
    ///
    /// Tasks are removed first so comment rows cascade with them, then
    /// the context's users. Accounts created through the API inside a
    /// test are that test's responsibility.
    pub async fn cleanup(&self) {
        sqlx::query(
            "DELETE FROM tasks
             WHERE created_by IN ($1, $2) OR assigned_to IN ($1, $2)",
        )
        .bind(self.admin.id)
        .bind(self.developer.id)
        .execute(&self.db)
        .await
        .expect("failed to delete test tasks");

        sqlx::query("DELETE FROM users WHERE id IN ($1, $2)")
            .bind(self.admin.id)
            .bind(self.developer.id)
            .execute(&self.db)
            .await
            .expect("failed to delete test users");
    }
}

async fn create_test_user(db: &PgPool, name: &str, role: Role) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("failed to hash test password");

    User::create(
        db,
        CreateUser {
            name: name.to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            role,
            password_hash,
        },
        SystemClock.now(),
    )
    .await
    .expect("failed to create test user")
}

fn mint_token(user_id: Uuid) -> String {
    create_token(&Claims::new(user_id), TEST_JWT_SECRET).expect("failed to mint test token")
}

/// Builds an authenticated JSON request
pub fn json_request(method: &str, uri: &str, auth: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", auth)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds an authenticated request with no body
pub fn bare_request(method: &str, uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", auth)
        .body(Body::empty())
        .unwrap()
}

/// Reads a response body as JSON
pub async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
