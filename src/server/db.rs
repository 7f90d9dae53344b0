use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::StartupError;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens the Postgres pool. Any failure here aborts startup.
pub async fn connect(database_url: Option<&str>) -> Result<PgPool, StartupError> {
    let url = database_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(StartupError::DatabaseUrlMissing)?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_is_fatal() {
        assert!(matches!(
            connect(None).await,
            Err(StartupError::DatabaseUrlMissing)
        ));
        assert!(matches!(
            connect(Some("  ")).await,
            Err(StartupError::DatabaseUrlMissing)
        ));
    }

    #[tokio::test]
    async fn test_malformed_url_is_fatal() {
        assert!(matches!(
            connect(Some("not a url")).await,
            Err(StartupError::Database(_))
        ));
    }
}
