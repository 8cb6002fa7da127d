use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};
use tracing::info;

use crate::error::Result;

pub mod models;

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL database (pool size {})", max_connections);
    Ok(pool)
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
