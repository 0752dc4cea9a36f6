pub mod catalog;
pub mod repository;
pub mod service;
pub mod types;

pub use catalog::{report_plan, CascadeNode, IndicatorGroup, NodeSelection};
pub use repository::{BreakdownRepository, SqliteBreakdownRepository};
pub use service::{BreakdownService, BreakdownServiceImpl};
pub use types::{BreakdownRequest, ColumnDef, NamedTable};
