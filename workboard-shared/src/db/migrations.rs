/// Database migration runner
///
/// Migrations live in `migrations/` at the workspace root and are
/// embedded into the binary at compile time, so a deployed server can
/// migrate its own schema on startup.
use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply or the recorded
/// history conflicts with the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
