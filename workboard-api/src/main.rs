use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workboard_api::{app, bootstrap, config::Config};
use workboard_shared::db;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Workboard API v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;

    // Connect to database
    let db_config = db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let pool = db::create_pool(db_config).await?;
    tracing::info!("Database connection established");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Seed the first admin on an empty deployment
    bootstrap::ensure_admin(&pool, &config).await?;

    let bind_address = config.bind_address();

    // Build application
    let state = app::AppState::new(pool, config);
    let router = app::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router).await?;

    Ok(())
}
