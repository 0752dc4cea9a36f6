use std::future::Future;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::errors::{DbError, DbResult};

/// Stable name plus statement fingerprint, used to identify a query in logs
/// without writing the statement text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIdentity {
    pub name: &'static str,
    pub fingerprint: String,
}

impl QueryIdentity {
    pub fn of(name: &'static str, sql: &str) -> Self {
        let digest = Sha256::digest(sql.as_bytes());
        Self {
            name,
            fingerprint: hex::encode(&digest[..6]),
        }
    }
}

impl std::fmt::Display for QueryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.fingerprint)
    }
}

/// Run one database future under the configured timeout.
///
/// Timeouts and driver failures are logged with the query identity and
/// returned as [`DbError`]; the caller decides how to surface them.
pub async fn run_timed<F, T>(identity: &QueryIdentity, timeout: Duration, query: F) -> DbResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let started = Instant::now();
    log::debug!("Executing query {}", identity);

    match tokio::time::timeout(timeout, query).await {
        Ok(Ok(value)) => {
            log::debug!("Query {} finished in {:?}", identity, started.elapsed());
            Ok(value)
        }
        Ok(Err(e)) => {
            log::error!("Query {} failed: {}", identity, e);
            Err(DbError::Sqlx(e))
        }
        Err(_) => {
            log::warn!("Query {} timed out after {:?}", identity, timeout);
            Err(DbError::Timeout {
                query: identity.to_string(),
                after_ms: timeout.as_millis() as u64,
            })
        }
    }
}

/// Open the shared SQLite pool described by the config.
pub async fn connect_pool(config: &AppConfig) -> DbResult<SqlitePool> {
    log::info!("Creating database pool (max {} connections)", config.max_connections);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.query_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            log::error!("Database connection failed: {}", e);
            DbError::Sqlx(e)
        })?;

    log::info!("Database pool established");
    Ok(pool)
}
