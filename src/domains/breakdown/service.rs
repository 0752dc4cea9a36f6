use async_trait::async_trait;
use std::sync::Arc;

use crate::domains::breakdown::catalog::{report_plan, NodeSelection};
use crate::domains::breakdown::repository::BreakdownRepository;
use crate::domains::breakdown::types::{BreakdownRequest, NamedTable};
use crate::errors::ServiceResult;
use crate::validation::Validate;

/// Trait defining breakdown service operations
#[async_trait]
pub trait BreakdownService: Send + Sync {
    async fn get_breakdown(&self, request: BreakdownRequest) -> ServiceResult<Vec<NamedTable>>;
}

/// Implementation of the breakdown service
#[derive(Clone)]
pub struct BreakdownServiceImpl {
    repo: Arc<dyn BreakdownRepository>,
}

impl BreakdownServiceImpl {
    pub fn new(repo: Arc<dyn BreakdownRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl BreakdownService for BreakdownServiceImpl {
    async fn get_breakdown(&self, request: BreakdownRequest) -> ServiceResult<Vec<NamedTable>> {
        request.filter.validate()?;

        let selection = NodeSelection::resolve(&request.node);
        match &selection {
            NodeSelection::ChartElement => {
                log::debug!("Label '{}' is a chart element, no breakdown", request.node);
                return Ok(Vec::new());
            }
            NodeSelection::Fallback(label) => {
                log::warn!("No breakdown defined for node '{}', using linkage fallback", label);
            }
            NodeSelection::Cascade(node) => {
                log::debug!("Breakdown for node '{}'", node.label());
            }
        }

        let plan = report_plan(&selection);
        let tables = self.repo.run_reports(&request.filter, &plan).await.map_err(|e| {
            log::error!(
                "Breakdown failed for node '{}' with {}: {}",
                request.node,
                request.filter.summary(),
                e
            );
            e
        })?;

        log::info!(
            "Returning {} breakdown tables for node '{}' with {}",
            tables.len(),
            request.node.trim(),
            request.filter.summary()
        );
        Ok(tables)
    }
}
