use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Settlement run errors. Any of these aborts the whole batch.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Storage failure during {operation}: {message}")]
    StorageFailure {
        operation: &'static str,
        message: String,
    },

    #[error("Storage call {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(msg) | AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                msg,
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::Settlement(e @ SettlementError::Timeout { .. }) => {
                error!("Settlement aborted: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SETTLEMENT_TIMEOUT",
                    "Settlement could not be completed in time".to_string(),
                    None,
                )
            }
            AppError::Settlement(e @ SettlementError::StorageFailure { .. }) => {
                error!("Settlement aborted: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SETTLEMENT_FAILED",
                    "Settlement failed".to_string(),
                    None,
                )
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_hides_internals() {
        let err = AppError::from(SettlementError::StorageFailure {
            operation: "find_resolved_markets",
            message: "connection refused (10.0.0.4:5432)".to_string(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_settlement_timeout_body_is_generic() {
        let response = AppError::from(SettlementError::Timeout {
            operation: "find_bets_by_market_ids",
            timeout_ms: 50,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error_code"], "SETTLEMENT_TIMEOUT");
        assert!(body["details"].is_null());
        assert!(!String::from_utf8_lossy(&bytes).contains("find_bets_by_market_ids"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("bet".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("resolved".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(SettlementError::Timeout {
                operation: "find_bets_by_market_ids",
                timeout_ms: 50,
            })
            .into_response()
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
