use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use super::models::{CreateMarketRequest, Market, Outcome, ResolveMarketRequest, UpdateMarketRequest};
use crate::api::AppState;
use crate::audit::{AuditAction, AuditEntry};
use crate::error::{AppError, AppResult};
use crate::store::Resolution;

const COLLECTION: &str = "markets";

/// Offered outcomes need distinct, non-empty labels and a probability in (0, 1]
fn validate_outcomes(outcomes: &[Outcome]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for outcome in outcomes {
        if outcome.label.trim().is_empty() {
            return Err(AppError::InvalidInput("Outcome label cannot be empty".to_string()));
        }
        if outcome.probability <= Decimal::ZERO || outcome.probability > Decimal::ONE {
            return Err(AppError::InvalidInput(format!(
                "Outcome {} has probability {} outside (0, 1]",
                outcome.label, outcome.probability
            )));
        }
        if !seen.insert(outcome.label.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Outcome {} is listed twice",
                outcome.label
            )));
        }
    }
    Ok(())
}

/// POST /api/markets
pub async fn create_market(
    State(state): State<AppState>,
    Json(req): Json<CreateMarketRequest>,
) -> AppResult<(StatusCode, Json<Market>)> {
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput(
                "No name was provided. Please repeat request providing a name for the new market"
                    .to_string(),
            )
        })?;

    validate_outcomes(&req.possible_outcomes)?;

    if let Some(event_id) = req.event_id {
        if state.events.find_event_by_id(event_id).await?.is_none() {
            return Err(AppError::InvalidInput(format!("Event {} does not exist", event_id)));
        }
    }

    let market = state
        .markets
        .create_market(Market::new(name, req.event_id, req.possible_outcomes))
        .await?;

    info!("Market created: {}", market.id);
    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Created, COLLECTION, market.id));

    Ok((StatusCode::CREATED, Json(market)))
}

/// GET /api/markets/:id
pub async fn get_market(
    State(state): State<AppState>,
    Path(market_id): Path<Uuid>,
) -> AppResult<Json<Market>> {
    let market = state
        .markets
        .find_market_by_id(market_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Market {}", market_id)))?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Read, COLLECTION, market.id));

    Ok(Json(market))
}

/// GET /api/markets/by-event/:id
pub async fn get_markets_by_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<Vec<Market>>> {
    let markets = state.markets.find_markets_by_event(event_id).await?;

    state
        .audit
        .emit(AuditEntry::on_collection(AuditAction::List, COLLECTION));

    Ok(Json(markets))
}

/// PUT /api/markets/:id
pub async fn update_market(
    State(state): State<AppState>,
    Path(market_id): Path<Uuid>,
    Json(req): Json<UpdateMarketRequest>,
) -> AppResult<Json<Market>> {
    let mut market = state
        .markets
        .find_market_by_id(market_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Market {}", market_id)))?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Market name cannot be empty".to_string()));
        }
        market.name = name;
    }

    if let Some(outcomes) = req.possible_outcomes {
        if market.is_resolved() {
            return Err(AppError::Conflict(format!(
                "Market {} is resolved, its outcomes are closed",
                market_id
            )));
        }
        validate_outcomes(&outcomes)?;
        market.possible_outcomes = outcomes;
    }

    let market = state.markets.update_market(market).await?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Update, COLLECTION, market.id));

    Ok(Json(market))
}

/// POST /api/markets/:id/resolve
///
/// Sets the resolved outcome once. Repeating the same label is accepted,
/// any other label on a resolved market is a conflict.
pub async fn resolve_market(
    State(state): State<AppState>,
    Path(market_id): Path<Uuid>,
    Json(req): Json<ResolveMarketRequest>,
) -> AppResult<Json<Market>> {
    let market = state
        .markets
        .find_market_by_id(market_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Market {}", market_id)))?;

    let outcome = market
        .offered_outcome(&req.label)
        .cloned()
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Market {} does not offer outcome {}",
                market_id, req.label
            ))
        })?;

    let resolution = state
        .markets
        .resolve_market(market_id, outcome)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Market {}", market_id)))?;

    let market = match resolution {
        Resolution::Resolved(market) => {
            info!("🏁 Market {} resolved to {}", market.id, req.label);
            state
                .audit
                .emit(AuditEntry::on_record(AuditAction::Update, COLLECTION, market.id));
            market
        }
        Resolution::AlreadyResolved(market) => {
            let same = market
                .resolved_outcome
                .as_ref()
                .is_some_and(|o| o.label == req.label);
            if !same {
                return Err(AppError::Conflict(format!(
                    "Market {} is already resolved",
                    market_id
                )));
            }
            market
        }
    };

    Ok(Json(market))
}

/// DELETE /api/markets/:id
pub async fn delete_market(
    State(state): State<AppState>,
    Path(market_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.markets.delete_market(market_id).await? {
        return Err(AppError::NotFound(format!("Market {}", market_id)));
    }

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Delete, COLLECTION, market_id));

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/markets
pub async fn list_markets(State(state): State<AppState>) -> AppResult<Json<Vec<Market>>> {
    let markets = state.markets.list_markets().await?;

    state
        .audit
        .emit(AuditEntry::on_collection(AuditAction::List, COLLECTION));

    Ok(Json(markets))
}
