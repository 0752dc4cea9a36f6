use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::{DbError, DomainError, ServiceError, ValidationError};

/// Structured error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationError),
    #[error("Query timed out: {0}")]
    Timeout(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match &self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
                None,
            ),
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                err.to_string(),
                Some(err.field().to_string()),
            ),
            ApiError::Timeout(detail) => {
                log::warn!("Request timed out: {}", detail);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "QUERY_TIMEOUT",
                    "The query took too long to complete".to_string(),
                    None,
                )
            }
            ApiError::Unavailable(detail) => {
                log::warn!("Service unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UNAVAILABLE",
                    "The database is not reachable".to_string(),
                    None,
                )
            }
            ApiError::Internal(detail) => {
                log::error!("API internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message, field },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(DomainError::Validation(e)) => ApiError::Validation(e),
            ServiceError::Domain(DomainError::Database(e)) => ApiError::from(e),
            ServiceError::Configuration(detail) => ApiError::Internal(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let err = ApiError::from(ServiceError::from(ValidationError::format(
            "CohortYearMonthStart",
            "must be in the format YYYY-MM-DD",
        )));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"]["field"], "CohortYearMonthStart");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let err = ApiError::from(ServiceError::from(DbError::Timeout {
            query: "sankey.flows#abc".to_string(),
            after_ms: 5000,
        }));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "QUERY_TIMEOUT");
        assert!(body["error"].get("field").is_none());
    }

    #[tokio::test]
    async fn test_database_failures_hide_details() {
        let err = ApiError::from(ServiceError::from(DbError::Sqlx(sqlx::Error::Protocol(
            "no such column: SELECT secret FROM x".to_string(),
        ))));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(!body.to_string().contains("secret"));
    }
}
