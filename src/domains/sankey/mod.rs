pub mod repository;
pub mod service;
pub mod types;

pub use repository::{SankeyRepository, SqliteSankeyRepository};
pub use service::{SankeyService, SankeyServiceImpl};
pub use types::{FlowResult, SankeyLink};
