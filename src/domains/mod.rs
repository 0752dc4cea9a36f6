pub mod breakdown;
pub mod filter;
pub mod sankey;

pub use breakdown::{BreakdownService, BreakdownServiceImpl};
pub use filter::CohortFilter;
pub use sankey::{SankeyService, SankeyServiceImpl};
