use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::time::Duration;

use crate::database::{run_timed, QueryIdentity, SENTINEL_TABLE};
use crate::domains::breakdown::types::{NamedTable, ReportPlan, ReportSpec};
use crate::domains::filter::{CohortFilter, PredicateSet};
use crate::errors::{DbError, DomainResult};

/// Grouped aggregations over the sentinel event table
#[async_trait]
pub trait BreakdownRepository: Send + Sync {
    /// Run every report of the plan, in plan order
    async fn run_reports(&self, filter: &CohortFilter, plan: &ReportPlan) -> DomainResult<Vec<NamedTable>>;
}

/// SQLite implementation for BreakdownRepository
pub struct SqliteBreakdownRepository {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteBreakdownRepository {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    fn build_report_query(
        filter: &CohortFilter,
        plan: &ReportPlan,
        report: &ReportSpec,
    ) -> QueryBuilder<'static, Sqlite> {
        let group_column = report.group_by.column();

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        builder.push(group_column);
        for metric in &report.metrics {
            builder.push(", ").push(metric.source.sql_expression());
        }
        builder.push(" FROM ").push(SENTINEL_TABLE);

        PredicateSet::from_filter(filter)
            .extend(plan.base.iter().map(|condition| condition.to_predicate()))
            .extend(report.conditions.iter().map(|condition| condition.to_predicate()))
            .push_where(&mut builder);

        builder
            .push(" GROUP BY ")
            .push(group_column)
            .push(" ORDER BY ")
            .push(group_column);
        builder
    }

    fn decode_row(report: &ReportSpec, row: &SqliteRow) -> Result<Map<String, Value>, sqlx::Error> {
        let mut object = Map::new();

        let group: Option<String> = row.try_get(0)?;
        object.insert(
            report.group_by.row_key().to_string(),
            group.map(Value::String).unwrap_or(Value::Null),
        );

        for (index, metric) in report.metrics.iter().enumerate() {
            let value: i64 = row.try_get(index + 1)?;
            object.insert(metric.field.to_string(), Value::from(value));
        }

        Ok(object)
    }

    async fn run_report(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        filter: &CohortFilter,
        plan: &ReportPlan,
        report: &ReportSpec,
    ) -> DomainResult<NamedTable> {
        let mut builder = Self::build_report_query(filter, plan, report);
        let identity = QueryIdentity::of("breakdown.report", builder.sql());
        log::debug!("Report '{}' runs as {}", report.title, identity);

        let rows = run_timed(&identity, self.query_timeout, builder.build().fetch_all(&mut **conn)).await?;
        let rows = rows
            .iter()
            .map(|row| Self::decode_row(report, row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;

        Ok(NamedTable {
            table_title: report.title.clone(),
            columns: report.columns(),
            rows,
        })
    }
}

#[async_trait]
impl BreakdownRepository for SqliteBreakdownRepository {
    async fn run_reports(&self, filter: &CohortFilter, plan: &ReportPlan) -> DomainResult<Vec<NamedTable>> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let mut tables = Vec::with_capacity(plan.reports.len());
        for report in &plan.reports {
            tables.push(self.run_report(&mut conn, filter, plan, report).await?);
        }
        Ok(tables)
    }
}
