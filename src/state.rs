use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::{connect_pool, run_timed, QueryIdentity};
use crate::db_migration;
use crate::domains::breakdown::{BreakdownService, BreakdownServiceImpl, SqliteBreakdownRepository};
use crate::domains::sankey::{SankeyService, SankeyServiceImpl, SqliteSankeyRepository};
use crate::errors::{DbResult, ServiceResult};

const READINESS_QUERY: &str = "SELECT 1";

/// Shared handles injected into every request handler
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub query_timeout: Duration,
    pub sankey_service: Arc<dyn SankeyService>,
    pub breakdown_service: Arc<dyn BreakdownService>,
}

impl AppState {
    /// Connect to the database and wire up the services.
    pub async fn initialize(config: &AppConfig) -> ServiceResult<Self> {
        let pool = connect_pool(config).await?;

        if config.apply_schema {
            log::info!("APPLY_SCHEMA set, creating surveillance tables if missing");
            db_migration::initialize_database(&pool).await?;
        }

        Ok(Self::from_pool(pool, config.query_timeout))
    }

    pub fn from_pool(pool: SqlitePool, query_timeout: Duration) -> Self {
        let sankey_repo = Arc::new(SqliteSankeyRepository::new(pool.clone(), query_timeout));
        let breakdown_repo = Arc::new(SqliteBreakdownRepository::new(pool.clone(), query_timeout));

        Self {
            pool,
            query_timeout,
            sankey_service: Arc::new(SankeyServiceImpl::new(sankey_repo)),
            breakdown_service: Arc::new(BreakdownServiceImpl::new(breakdown_repo)),
        }
    }

    /// Round-trip a trivial query to check the database is reachable.
    pub async fn ping(&self) -> DbResult<()> {
        let identity = QueryIdentity::of("health.ready", READINESS_QUERY);
        run_timed(
            &identity,
            self.query_timeout,
            sqlx::query(READINESS_QUERY).execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
