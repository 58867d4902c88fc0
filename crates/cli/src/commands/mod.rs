//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use bazaar_api::db;
use sqlx::PgPool;

/// Connect using `DATABASE_URL` or the `DB_*` parts.
pub(crate) async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let database_url = bazaar_api::config::database_url_from_env()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
