use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domains::filter::{CohortFilter, Dimension, Predicate};

/// Drill-down request: a node label plus the usual filter selections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRequest {
    pub node: String,
    #[serde(flatten)]
    pub filter: CohortFilter,
}

/// Display metadata for one report column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub field: String,
    pub header_name: String,
    pub flex: u32,
    pub min_width: u32,
}

impl ColumnDef {
    pub fn new(field: &str, header_name: &str, min_width: u32) -> Self {
        Self {
            field: field.to_string(),
            header_name: header_name.to_string(),
            flex: 1,
            min_width,
        }
    }
}

/// One report as rendered by the dashboard table component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedTable {
    pub table_title: String,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Map<String, Value>>,
}

/// Integer flag columns of the sentinel event table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelFlag {
    LinkedToArt,
    NotLinkedToArt,
    WithBaselineCd4,
    WithoutBaselineCd4,
    Ahd,
    NotStaged,
    WithInitialViralLoad,
    WithoutInitialViralLoad,
    InitialViralLoadSuppressed,
    RegimenChanged,
    RegimenNotChanged,
    LatestViralLoadSuppressed,
    LatestViralLoadNotSuppressed,
    PatientRetained,
    PatientNotRetained,
}

impl SentinelFlag {
    pub fn column(&self) -> &'static str {
        match self {
            SentinelFlag::LinkedToArt => "LinkedToART",
            SentinelFlag::NotLinkedToArt => "NotLinkedToART",
            SentinelFlag::WithBaselineCd4 => "WithBaselineCD4",
            SentinelFlag::WithoutBaselineCd4 => "WithoutBaselineCD4",
            SentinelFlag::Ahd => "AHD",
            SentinelFlag::NotStaged => "NotStaged",
            SentinelFlag::WithInitialViralLoad => "WithInitialViralLoad",
            SentinelFlag::WithoutInitialViralLoad => "WithoutInitialViralLoad",
            SentinelFlag::InitialViralLoadSuppressed => "IsSuppressedInitialViralload",
            SentinelFlag::RegimenChanged => "RegimenChanged",
            SentinelFlag::RegimenNotChanged => "RegimenNotChanged",
            SentinelFlag::LatestViralLoadSuppressed => "LatestVLSuppressed",
            SentinelFlag::LatestViralLoadNotSuppressed => "LatestVLNotSuppressed",
            SentinelFlag::PatientRetained => "PatientRetained",
            SentinelFlag::PatientNotRetained => "PatientNotRetained",
        }
    }

    pub fn is_set(self) -> FlagCondition {
        FlagCondition { flag: self, value: 1 }
    }

    pub fn is_unset(self) -> FlagCondition {
        FlagCondition { flag: self, value: 0 }
    }
}

/// `flag = value` restriction on sentinel events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagCondition {
    pub flag: SentinelFlag,
    pub value: i64,
}

impl FlagCondition {
    pub fn to_predicate(&self) -> Predicate {
        Predicate::Equals {
            column: self.flag.column(),
            value: self.value,
        }
    }
}

/// How a metric column is computed per group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Sum of a 0/1 flag
    Sum(SentinelFlag),
    /// Rows where the flag is 0
    CountUnset(SentinelFlag),
    /// All rows in the group
    CountRows,
}

impl MetricSource {
    pub fn sql_expression(&self) -> String {
        match self {
            MetricSource::Sum(flag) => format!("COALESCE(SUM({}), 0)", flag.column()),
            MetricSource::CountUnset(flag) => {
                format!("COALESCE(SUM(CASE WHEN {} = 0 THEN 1 ELSE 0 END), 0)", flag.column())
            }
            MetricSource::CountRows => "COUNT(*)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricColumn {
    pub field: &'static str,
    pub header: &'static str,
    pub source: MetricSource,
    pub min_width: u32,
}

impl MetricColumn {
    pub const fn new(field: &'static str, header: &'static str, source: MetricSource) -> Self {
        Self {
            field,
            header,
            source,
            min_width: 150,
        }
    }
}

/// One grouped aggregation over sentinel events
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub title: String,
    pub conditions: Vec<FlagCondition>,
    pub group_by: Dimension,
    pub metrics: Vec<MetricColumn>,
}

impl ReportSpec {
    pub fn by_gender(title: impl Into<String>, metrics: Vec<MetricColumn>) -> Self {
        Self {
            title: title.into(),
            conditions: Vec::new(),
            group_by: Dimension::Gender,
            metrics,
        }
    }

    /// Static column metadata: group key first, then each metric
    pub fn columns(&self) -> Vec<ColumnDef> {
        let mut columns = vec![ColumnDef::new(
            self.group_by.row_key(),
            self.group_by.header_name(),
            120,
        )];
        columns.extend(
            self.metrics
                .iter()
                .map(|metric| ColumnDef::new(metric.field, metric.header, metric.min_width)),
        );
        columns
    }
}

/// Everything needed to answer one breakdown request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPlan {
    pub base: Vec<FlagCondition>,
    pub reports: Vec<ReportSpec>,
}

impl ReportPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_request_flattens_filter_fields() {
        let request: BreakdownRequest = serde_json::from_value(serde_json::json!({
            "node": "Linked",
            "County": ["Nairobi"],
            "CohortYearMonthEnd": "2023-07-01"
        }))
        .unwrap();

        assert_eq!(request.node, "Linked");
        assert_eq!(request.filter.counties, Some(vec!["Nairobi".to_string()]));
        assert_eq!(request.filter.cohort_end.as_deref(), Some("2023-07-01"));
    }

    #[test]
    fn test_column_metadata_serializes_for_data_grid() {
        let value = serde_json::to_value(ColumnDef::new("number", "Number", 150)).unwrap();
        assert_eq!(value, serde_json::json!({
            "field": "number",
            "headerName": "Number",
            "flex": 1,
            "minWidth": 150
        }));
    }

    #[test]
    fn test_metric_expressions() {
        assert_eq!(
            MetricSource::Sum(SentinelFlag::LinkedToArt).sql_expression(),
            "COALESCE(SUM(LinkedToART), 0)"
        );
        assert_eq!(
            MetricSource::CountUnset(SentinelFlag::Ahd).sql_expression(),
            "COALESCE(SUM(CASE WHEN AHD = 0 THEN 1 ELSE 0 END), 0)"
        );
        assert_eq!(MetricSource::CountRows.sql_expression(), "COUNT(*)");
    }

    #[test]
    fn test_report_columns_start_with_group_key() {
        let spec = ReportSpec::by_gender(
            "Not Linked",
            vec![MetricColumn::new("number", "Number", MetricSource::Sum(SentinelFlag::NotLinkedToArt))],
        );
        let fields: Vec<String> = spec.columns().into_iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["gender".to_string(), "number".to_string()]);
    }

    #[test]
    fn test_flag_condition_becomes_bound_predicate() {
        assert_eq!(
            SentinelFlag::Ahd.is_unset().to_predicate(),
            Predicate::Equals { column: "AHD", value: 0 }
        );
    }
}
