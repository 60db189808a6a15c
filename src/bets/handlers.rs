use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::models::{Bet, BetResponse, BetStatus, CreateBetRequest, UpdateBetRequest};
use crate::api::AppState;
use crate::audit::{AuditAction, AuditEntry};
use crate::error::{AppError, AppResult};
use crate::settlement::ChartReport;

const COLLECTION: &str = "bets";

async fn with_status(state: &AppState, bet: Bet) -> AppResult<BetResponse> {
    let market = state.markets.find_market_by_id(bet.market_id).await?;
    let status = bet.status(market.as_ref());
    Ok(BetResponse { bet, status })
}

fn validate_amount(amount: Decimal) -> AppResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::InvalidInput(format!(
            "Bet amount {} cannot be negative",
            amount
        )));
    }
    Ok(())
}

/// POST /api/bets
///
/// The chosen outcome must be offered by an open market. Its current
/// probability is locked into the bet.
pub async fn create_bet(
    State(state): State<AppState>,
    Json(req): Json<CreateBetRequest>,
) -> AppResult<(StatusCode, Json<BetResponse>)> {
    let (event_id, market_id) = match (req.event_id, req.market_id) {
        (Some(event_id), Some(market_id)) => (event_id, market_id),
        _ => {
            return Err(AppError::BadRequest(
                "A bet needs both an eventId and a marketId".to_string(),
            ))
        }
    };

    validate_amount(req.amount)?;

    if state.events.find_event_by_id(event_id).await?.is_none() {
        return Err(AppError::InvalidInput(format!("Event {} does not exist", event_id)));
    }

    let market = state
        .markets
        .find_market_by_id(market_id)
        .await?
        .ok_or_else(|| AppError::InvalidInput(format!("Market {} does not exist", market_id)))?;

    if market.is_resolved() {
        return Err(AppError::Conflict(format!(
            "Market {} is resolved and takes no more bets",
            market_id
        )));
    }

    let chosen = market.offered_outcome(&req.outcome).cloned().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Market {} does not offer outcome {}",
            market_id, req.outcome
        ))
    })?;

    let bet = state
        .bets
        .create_bet(Bet::new(event_id, market_id, req.name, chosen, req.amount))
        .await?;

    info!(
        "Bet created: {} ({} on {} at {})",
        bet.id, bet.amount, bet.chosen_outcome.label, bet.chosen_outcome.probability
    );
    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Created, COLLECTION, bet.id));

    Ok((
        StatusCode::CREATED,
        Json(BetResponse {
            bet,
            status: BetStatus::Pending,
        }),
    ))
}

/// GET /api/bets/:id
pub async fn get_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
) -> AppResult<Json<BetResponse>> {
    let bet = state
        .bets
        .find_bet_by_id(bet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bet {}", bet_id)))?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Read, COLLECTION, bet.id));

    Ok(Json(with_status(&state, bet).await?))
}

/// PUT /api/bets/:id
pub async fn update_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
    Json(req): Json<UpdateBetRequest>,
) -> AppResult<Json<BetResponse>> {
    let mut bet = state
        .bets
        .find_bet_by_id(bet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bet {}", bet_id)))?;

    let market = state.markets.find_market_by_id(bet.market_id).await?;
    if bet.is_settled() || bet.status(market.as_ref()) != BetStatus::Pending {
        return Err(AppError::Conflict(format!("Bet {} is no longer pending", bet_id)));
    }

    if let Some(name) = req.name {
        bet.name = Some(name);
    }
    if let Some(amount) = req.amount {
        validate_amount(amount)?;
        bet.amount = amount;
    }

    let bet = state.bets.update_bet(bet).await?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Update, COLLECTION, bet.id));

    Ok(Json(BetResponse {
        bet,
        status: BetStatus::Pending,
    }))
}

/// DELETE /api/bets/:id
pub async fn delete_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.bets.delete_bet(bet_id).await? {
        return Err(AppError::NotFound(format!("Bet {}", bet_id)));
    }

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Delete, COLLECTION, bet_id));

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/bets
pub async fn list_bets(State(state): State<AppState>) -> AppResult<Json<Vec<BetResponse>>> {
    let bets = state.bets.list_bets().await?;
    let markets: HashMap<Uuid, _> = state
        .markets
        .list_markets()
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    state
        .audit
        .emit(AuditEntry::on_collection(AuditAction::List, COLLECTION));

    let bets = bets
        .into_iter()
        .map(|bet| {
            let status = bet.status(markets.get(&bet.market_id));
            BetResponse { bet, status }
        })
        .collect();

    Ok(Json(bets))
}

/// GET /api/bets/report
///
/// Settles every bet on a resolved market and returns the chart report
pub async fn get_chart_report(State(state): State<AppState>) -> AppResult<Json<ChartReport>> {
    let report = state.settlement.settle().await?;
    Ok(Json(ChartReport::from(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(dec!(10)).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(dec!(-0.01)).is_err());
    }
}
