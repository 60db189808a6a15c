use crate::markets::models::{Market, Outcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived bet status, never stored
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

/// Bet entity - a stake on one outcome of one market, odds locked at placement
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: Uuid,
    pub event_id: Uuid,
    pub market_id: Uuid,
    pub name: Option<String>,
    pub chosen_outcome: Outcome,
    pub amount: Decimal,
    /// Zero until the first settlement, frozen afterwards
    pub payout_margin: Decimal,
    pub payout_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bet {
    pub fn new(
        event_id: Uuid,
        market_id: Uuid,
        name: Option<String>,
        chosen_outcome: Outcome,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id,
            market_id,
            name,
            chosen_outcome,
            amount,
            payout_margin: Decimal::ZERO,
            payout_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.payout_margin.is_zero()
    }

    /// Status against the bet's market; `None` means the market is unknown
    pub fn status(&self, market: Option<&Market>) -> BetStatus {
        match market.and_then(|m| m.resolved_outcome.as_ref()) {
            Some(resolved) if resolved.label == self.chosen_outcome.label => BetStatus::Won,
            Some(_) => BetStatus::Lost,
            None => BetStatus::Pending,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBetRequest {
    pub event_id: Option<Uuid>,
    pub market_id: Option<Uuid>,
    pub name: Option<String>,
    /// Label of one of the market's offered outcomes
    pub outcome: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBetRequest {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
}

/// Bet as returned by the CRUD endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResponse {
    #[serde(flatten)]
    pub bet: Bet,
    pub status: BetStatus,
}
