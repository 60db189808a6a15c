use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub storage: StorageStatus,
}

/// Storage backend status
#[derive(Debug, Serialize)]
pub struct StorageStatus {
    pub backend: &'static str,
    pub reachable: bool,
}
