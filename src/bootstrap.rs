use crate::config::AppConfig;
use sqlx::PgPool;

/// Create the initial admin identity if no admin exists yet. Idempotent:
/// re-running against a bootstrapped database is a no-op. Sign-in
/// credentials live with the upstream auth provider; only the identity
/// row is recorded here.
pub async fn ensure_admin_user(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let admin_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE is_admin)")
            .fetch_one(pool)
            .await?;

    if admin_exists {
        tracing::debug!("an admin user already exists, nothing to do");
        return Ok(());
    }

    let Some(admin) = &config.default_admin else {
        tracing::warn!("no admin user exists and [default_admin] is not configured, skipping");
        return Ok(());
    };

    sqlx::query(
        "INSERT INTO users (username, email, is_admin) VALUES ($1, $2, TRUE)
         ON CONFLICT (username) DO UPDATE SET is_admin = TRUE",
    )
    .bind(&admin.username)
    .bind(&admin.email)
    .execute(pool)
    .await?;

    tracing::info!(username = %admin.username, "admin user created");
    Ok(())
}
