use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::domains::breakdown::{BreakdownRequest, NamedTable};
use crate::domains::filter::CohortFilter;
use crate::domains::sankey::FlowResult;
use crate::state::AppState;
use crate::validation::request::{parse_payload, PayloadKind};

fn read_body(request_id: &Uuid, payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            log::warn!("[{}] Unreadable request body: {}", request_id, rejection.body_text());
            Err(ApiError::BadRequest(rejection.body_text()))
        }
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

pub async fn say_hello(Path(name): Path<String>) -> Json<Value> {
    Json(json!({ "message": format!("Hello {}", name) }))
}

/// Aggregate flows plus filter options for the diagram
pub async fn sankey_data(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<FlowResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let body = read_body(&request_id, payload)?;

    let filter: CohortFilter = parse_payload(PayloadKind::SankeyFilter, body).map_err(|e| {
        log::warn!("[{}] Rejected flow request: {}", request_id, e);
        e
    })?;
    log::info!("[{}] Flow request with {}", request_id, filter.summary());

    let result = state.sankey_service.get_flows(filter).await.map_err(|e| {
        log::error!("[{}] Flow request failed: {}", request_id, e);
        e
    })?;
    Ok(Json(result))
}

/// Drill-down tables for a clicked node
pub async fn sankey_breakdown(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<NamedTable>>, ApiError> {
    let request_id = Uuid::new_v4();
    let body = read_body(&request_id, payload)?;

    let request: BreakdownRequest = parse_payload(PayloadKind::Breakdown, body).map_err(|e| {
        log::warn!("[{}] Rejected breakdown request: {}", request_id, e);
        e
    })?;
    log::info!(
        "[{}] Breakdown request for node '{}' with {}",
        request_id,
        request.node,
        request.filter.summary()
    );

    let node = request.node.clone();
    let tables = state.breakdown_service.get_breakdown(request).await.map_err(|e| {
        log::error!("[{}] Breakdown for node '{}' failed: {}", request_id, node, e);
        e
    })?;
    Ok(Json(tables))
}

pub async fn readiness(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .ping()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    Ok(Json(json!({ "status": "ready" })))
}
