use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::time::Duration;

use crate::database::{run_timed, QueryIdentity, SANKEY_TABLE};
use crate::domains::filter::{CohortFilter, Dimension, Predicate, PredicateSet};
use crate::domains::sankey::types::{FlowResult, FlowRow, SankeyLink};
use crate::errors::{DbError, DomainResult};

/// Read access to the aggregate flow table
#[async_trait]
pub trait SankeyRepository: Send + Sync {
    /// Aggregate flows and option lists for the given selections
    async fn get_flows(&self, filter: &CohortFilter) -> DomainResult<FlowResult>;
}

/// SQLite implementation for SankeyRepository
pub struct SqliteSankeyRepository {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteSankeyRepository {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    async fn fetch_links(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        filter: &CohortFilter,
    ) -> DomainResult<Vec<SankeyLink>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT ord, source, target, COALESCE(SUM(metric), 0) AS weight FROM {}",
            SANKEY_TABLE
        ));
        PredicateSet::from_filter(filter).push_where(&mut builder);
        builder.push(" GROUP BY ord, source, target ORDER BY ord, source, target");

        let identity = QueryIdentity::of("sankey.flows", builder.sql());
        let rows: Vec<FlowRow> = run_timed(
            &identity,
            self.query_timeout,
            builder.build_query_as::<FlowRow>().fetch_all(&mut **conn),
        )
        .await?;

        Ok(rows.into_iter().map(SankeyLink::from).collect())
    }

    /// Sorted distinct non-null values of `target`, restricted by the
    /// selections on `cross_filter` only.
    async fn fetch_distinct(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        name: &'static str,
        target: Dimension,
        filter: &CohortFilter,
        cross_filter: &[Dimension],
    ) -> DomainResult<Vec<String>> {
        let column = target.column();
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT DISTINCT {} FROM {}",
            column, SANKEY_TABLE
        ));
        PredicateSet::for_dimensions(filter, cross_filter)
            .and(Predicate::Present { column })
            .push_where(&mut builder);
        builder.push(" ORDER BY ").push(column);

        let identity = QueryIdentity::of(name, builder.sql());
        let values = run_timed(
            &identity,
            self.query_timeout,
            builder.build_query_scalar::<String>().fetch_all(&mut **conn),
        )
        .await?;

        Ok(values)
    }
}

#[async_trait]
impl SankeyRepository for SqliteSankeyRepository {
    async fn get_flows(&self, filter: &CohortFilter) -> DomainResult<FlowResult> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

        let sankey_data = self.fetch_links(&mut conn, filter).await?;
        let unique_counties = self
            .fetch_distinct(&mut conn, "sankey.counties", Dimension::County, filter, &[Dimension::SubCounty])
            .await?;
        let unique_sub_counties = self
            .fetch_distinct(&mut conn, "sankey.sub_counties", Dimension::SubCounty, filter, &[Dimension::County])
            .await?;
        let unique_partners = self
            .fetch_distinct(&mut conn, "sankey.partners", Dimension::Partner, filter, &[])
            .await?;
        let unique_agencies = self
            .fetch_distinct(&mut conn, "sankey.agencies", Dimension::Agency, filter, &[])
            .await?;

        Ok(FlowResult {
            sankey_data,
            unique_counties,
            unique_sub_counties,
            unique_partners,
            unique_agencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_flow, seeded_pool, FlowFixture};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn weight_of(result: &FlowResult, from: &str, to: &str) -> Option<i64> {
        result
            .sankey_data
            .iter()
            .find(|link| link.from == from && link.to == to)
            .map(|link| link.weight)
    }

    async fn repository() -> SqliteSankeyRepository {
        SqliteSankeyRepository::new(seeded_pool().await, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_default_range_aggregates_flows() {
        let result = repository().await.get_flows(&CohortFilter::new()).await.unwrap();

        assert_eq!(result.sankey_data, vec![
            SankeyLink { from: "Total Cases Reported".into(), to: "Linked".into(), weight: 22 },
            SankeyLink { from: "Total Cases Reported".into(), to: "Not Linked".into(), weight: 3 },
            SankeyLink { from: "Linked".into(), to: "Initial CD4 Done".into(), weight: 12 },
        ]);
        // rows dated 2022-12 and 2024-01 fall outside [2023-01-01, 2024-01-01)
        assert_eq!(result.total_weight(), 37);
    }

    #[tokio::test]
    async fn test_distinct_lists_are_sorted_and_ignore_date_range() {
        let result = repository().await.get_flows(&CohortFilter::new()).await.unwrap();

        assert_eq!(result.unique_counties, strings(&["Kisumu", "Mombasa", "Nairobi"]));
        assert_eq!(
            result.unique_sub_counties,
            strings(&["Kibra", "Kisumu Central", "Mvita", "Nyando", "Westlands"])
        );
        assert_eq!(result.unique_partners, strings(&["Partner A", "Partner B", "Partner C"]));
        assert_eq!(result.unique_agencies, strings(&["CDC", "USAID"]));
    }

    #[tokio::test]
    async fn test_county_selection_narrows_flows_and_sub_counties() {
        let filter = CohortFilter::new().with_counties(strings(&["Nairobi"]));
        let result = repository().await.get_flows(&filter).await.unwrap();

        assert_eq!(weight_of(&result, "Total Cases Reported", "Linked"), Some(15));
        assert_eq!(weight_of(&result, "Total Cases Reported", "Not Linked"), Some(3));
        assert_eq!(weight_of(&result, "Linked", "Initial CD4 Done"), Some(8));
        assert_eq!(result.unique_sub_counties, strings(&["Kibra", "Westlands"]));
        // counties are only cross-filtered by subcounty
        assert_eq!(result.unique_counties, strings(&["Kisumu", "Mombasa", "Nairobi"]));
    }

    #[tokio::test]
    async fn test_sub_county_selection_narrows_counties() {
        let filter = CohortFilter::new().with_sub_counties(strings(&["Mvita"]));
        let result = repository().await.get_flows(&filter).await.unwrap();

        assert_eq!(result.unique_counties, strings(&["Mombasa"]));
        assert_eq!(weight_of(&result, "Total Cases Reported", "Linked"), Some(7));
        assert_eq!(weight_of(&result, "Linked", "Initial CD4 Done"), Some(4));
    }

    #[tokio::test]
    async fn test_gender_selection_only_counts_members() {
        let filter = CohortFilter::new().with_genders(strings(&["Female", "Female"]));
        let result = repository().await.get_flows(&filter).await.unwrap();

        assert_eq!(weight_of(&result, "Total Cases Reported", "Linked"), Some(5));
        assert_eq!(weight_of(&result, "Total Cases Reported", "Not Linked"), Some(3));
        assert_eq!(weight_of(&result, "Linked", "Initial CD4 Done"), Some(4));
    }

    #[tokio::test]
    async fn test_custom_range_is_half_open() {
        let filter = CohortFilter::new().with_cohort_range(Some("2023-02-01"), Some("2023-03-01"));
        let result = repository().await.get_flows(&filter).await.unwrap();

        assert_eq!(result.sankey_data, vec![
            SankeyLink { from: "Total Cases Reported".into(), to: "Linked".into(), weight: 5 },
            SankeyLink { from: "Total Cases Reported".into(), to: "Not Linked".into(), weight: 3 },
        ]);
    }

    #[tokio::test]
    async fn test_no_matching_rows_is_not_an_error() {
        let filter = CohortFilter::new().with_counties(strings(&["Atlantis"]));
        let result = repository().await.get_flows(&filter).await.unwrap();

        assert!(result.sankey_data.is_empty());
        assert!(result.unique_sub_counties.is_empty());
        assert_eq!(result.unique_agencies, strings(&["CDC", "USAID"]));
    }

    #[tokio::test]
    async fn test_null_dimensions_are_left_out_of_option_lists() {
        let pool = seeded_pool().await;
        insert_flow(&pool, &FlowFixture {
            county: None,
            sub_county: None,
            ..FlowFixture::new("Total Cases Reported", "Linked", 1, 1, "2023-05-01")
        })
        .await;

        let result = SqliteSankeyRepository::new(pool, Duration::from_secs(5))
            .get_flows(&CohortFilter::new())
            .await
            .unwrap();

        assert_eq!(result.unique_counties, strings(&["Kisumu", "Mombasa", "Nairobi"]));
        assert_eq!(weight_of(&result, "Total Cases Reported", "Linked"), Some(23));
    }
}
