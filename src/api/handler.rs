use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::models::{HealthResponse, StorageStatus};
use crate::{
    audit::AuditSink,
    settlement::SettlementEngine,
    store::{BetStore, EventStore, MarketStore},
};

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventStore>,
    pub markets: Arc<dyn MarketStore>,
    pub bets: Arc<dyn BetStore>,
    pub settlement: Arc<SettlementEngine>,
    pub audit: AuditSink,
    pub storage_backend: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Cheap round trip through the store
    let reachable = match state.markets.find_market_by_id(Uuid::nil()).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Health check storage probe failed: {:?}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if reachable {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        storage: StorageStatus {
            backend: state.storage_backend,
            reachable,
        },
    })
}
