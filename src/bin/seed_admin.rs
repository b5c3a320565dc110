//! Seeds an admin account. Registration only ever creates `user` roles, so
//! the first admin has to come from here. Idempotent: if the email already
//! exists nothing is written.

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use spendtrack::auth::password;
use spendtrack::db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set")?;
    let email = std::env::var("ADMIN_EMAIL").map_err(|_| "ADMIN_EMAIL is not set")?;
    let admin_password =
        std::env::var("ADMIN_PASSWORD").map_err(|_| "ADMIN_PASSWORD is not set")?;
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string());

    if admin_password.len() < 8 {
        return Err("ADMIN_PASSWORD must be at least 8 characters".into());
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    if db::users::find_by_email(&pool, &email).await?.is_some() {
        tracing::info!(%email, "account already exists, nothing to do");
        return Ok(());
    }

    let pw_hash = password::hash(&admin_password)?;
    let user = db::users::create(&pool, &name, &email, &pw_hash, "admin").await?;

    tracing::info!(user_id = %user.id, %email, "admin account created");
    Ok(())
}
