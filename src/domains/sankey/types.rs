use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One aggregated edge of the cascade diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub from: String,
    pub to: String,
    pub weight: i64,
}

/// Row shape of the grouped flow query
#[derive(Debug, Clone, FromRow)]
pub struct FlowRow {
    pub ord: i64,
    pub source: String,
    pub target: String,
    pub weight: i64,
}

impl From<FlowRow> for SankeyLink {
    fn from(row: FlowRow) -> Self {
        Self {
            from: row.source,
            to: row.target,
            weight: row.weight,
        }
    }
}

/// Response of the flow endpoint: edges plus the filter option lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    pub sankey_data: Vec<SankeyLink>,
    pub unique_counties: Vec<String>,
    pub unique_sub_counties: Vec<String>,
    pub unique_partners: Vec<String>,
    pub unique_agencies: Vec<String>,
}

impl FlowResult {
    /// Sum of all edge weights
    pub fn total_weight(&self) -> i64 {
        self.sankey_data.iter().map(|link| link.weight).sum()
    }
}
