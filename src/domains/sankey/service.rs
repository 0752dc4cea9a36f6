use async_trait::async_trait;
use std::sync::Arc;

use crate::domains::filter::CohortFilter;
use crate::domains::sankey::repository::SankeyRepository;
use crate::domains::sankey::types::FlowResult;
use crate::errors::ServiceResult;
use crate::validation::Validate;

/// Trait defining flow service operations
#[async_trait]
pub trait SankeyService: Send + Sync {
    async fn get_flows(&self, filter: CohortFilter) -> ServiceResult<FlowResult>;
}

/// Implementation of the flow service
#[derive(Clone)]
pub struct SankeyServiceImpl {
    repo: Arc<dyn SankeyRepository>,
}

impl SankeyServiceImpl {
    pub fn new(repo: Arc<dyn SankeyRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SankeyService for SankeyServiceImpl {
    async fn get_flows(&self, filter: CohortFilter) -> ServiceResult<FlowResult> {
        filter.validate()?;

        log::debug!("Aggregating flows for {}", filter.summary());
        let result = self.repo.get_flows(&filter).await.map_err(|e| {
            log::error!("Flow aggregation failed for {}: {}", filter.summary(), e);
            e
        })?;

        log::info!(
            "Returning {} flows (total weight {}) for {}",
            result.sankey_data.len(),
            result.total_weight(),
            filter.summary()
        );
        Ok(result)
    }
}
