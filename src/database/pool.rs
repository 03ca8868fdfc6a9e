use crate::config::Config;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};

pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let statement_timeout = format!("SET statement_timeout = {}", config.db_statement_timeout_ms);
    let lock_timeout = format!("SET lock_timeout = {}", config.db_statement_timeout_ms);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(std::time::Duration::from_millis(
            config.db_statement_timeout_ms,
        ))
        .after_connect(move |conn, _meta| {
            let statement_timeout = statement_timeout.clone();
            let lock_timeout = lock_timeout.clone();
            Box::pin(async move {
                conn.execute(statement_timeout.as_str()).await?;
                conn.execute(lock_timeout.as_str()).await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
