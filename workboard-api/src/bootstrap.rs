/// First-run provisioning
///
/// A fresh deployment has no users and therefore no way to log in.
/// When the users table is empty and `ADMIN_EMAIL` / `ADMIN_NAME` /
/// `ADMIN_PASSWORD` are configured, an admin account is created at
/// startup. Once any user exists the variables are ignored.
use crate::config::Config;
use sqlx::PgPool;
use workboard_shared::auth::password::hash_password;
use workboard_shared::clock::{Clock, SystemClock};
use workboard_shared::models::user::{CreateUser, Role, User};
use workboard_shared::validate::{is_valid_email, normalize_email};

/// Seeds the bootstrap admin account when the users table is empty
///
/// Bad bootstrap credentials fail startup outright: a deployment that
/// cannot be logged into is better caught at boot than discovered
/// later.
pub async fn ensure_admin(db: &PgPool, config: &Config) -> anyhow::Result<()> {
    if User::count(db).await? > 0 {
        return Ok(());
    }

    let admin = match &config.bootstrap_admin {
        Some(admin) => admin,
        None => {
            tracing::warn!(
                "users table is empty and no bootstrap admin is configured; \
                 set ADMIN_EMAIL, ADMIN_NAME, and ADMIN_PASSWORD to seed one"
            );
            return Ok(());
        }
    };

    let email = normalize_email(&admin.email);
    if !is_valid_email(&email) {
        anyhow::bail!("ADMIN_EMAIL is not a valid email address");
    }

    let name = admin.name.trim();
    if name.is_empty() {
        anyhow::bail!("ADMIN_NAME must not be empty");
    }

    if admin.password.chars().count() < 6 {
        anyhow::bail!("ADMIN_PASSWORD must be at least 6 characters");
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|err| anyhow::anyhow!("failed to hash bootstrap password: {err}"))?;

    let data = CreateUser {
        name: name.to_string(),
        email: email.clone(),
        role: Role::Admin,
        password_hash,
    };

    match User::create(db, data, SystemClock.now()).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email = %email, "bootstrap admin created");
            Ok(())
        }
        // Another instance won the race between the count and the insert
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some("users_email_key") =>
        {
            tracing::debug!(email = %email, "bootstrap admin already exists");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
