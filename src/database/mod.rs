pub mod executor;

pub use executor::{connect_pool, run_timed, QueryIdentity};

/// Aggregate flow table feeding the Sankey diagram
pub const SANKEY_TABLE: &str = "CSAggregateSentinelSankey";

/// Per patient-period sentinel events feeding the breakdown reports
pub const SENTINEL_TABLE: &str = "CSAggregateSentinelEvents";
