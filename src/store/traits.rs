use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::bets::models::Bet;
use crate::error::AppResult;
use crate::events::models::Event;
use crate::markets::models::{Market, Outcome};

/// Result of a compare-and-set payout write
#[derive(Debug, Clone)]
pub enum PayoutWrite {
    /// The margin was still zero and the payout was written
    Applied(Bet),
    /// Another settlement got there first; the stored record is returned unchanged
    AlreadySettled(Bet),
}

impl PayoutWrite {
    pub fn into_bet(self) -> Bet {
        match self {
            PayoutWrite::Applied(bet) | PayoutWrite::AlreadySettled(bet) => bet,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, PayoutWrite::Applied(_))
    }
}

/// Result of a market resolution attempt
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(Market),
    /// The market already carried a resolved outcome, returned as stored
    AlreadyResolved(Market),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, event: Event) -> AppResult<Event>;

    async fn find_event_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;

    async fn list_events(&self) -> AppResult<Vec<Event>>;

    async fn update_event(&self, event: Event) -> AppResult<Event>;

    /// Returns false when nothing was deleted
    async fn delete_event(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn create_market(&self, market: Market) -> AppResult<Market>;

    async fn find_market_by_id(&self, id: Uuid) -> AppResult<Option<Market>>;

    async fn list_markets(&self) -> AppResult<Vec<Market>>;

    async fn find_markets_by_event(&self, event_id: Uuid) -> AppResult<Vec<Market>>;

    /// Markets carrying a resolved outcome
    async fn find_resolved_markets(&self) -> AppResult<Vec<Market>>;

    /// Updates descriptive fields. The resolved outcome is never written here.
    async fn update_market(&self, market: Market) -> AppResult<Market>;

    /// Sets the resolved outcome only if the market is still open
    async fn resolve_market(&self, id: Uuid, outcome: Outcome) -> AppResult<Option<Resolution>>;

    async fn delete_market(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait BetStore: Send + Sync {
    async fn create_bet(&self, bet: Bet) -> AppResult<Bet>;

    async fn find_bet_by_id(&self, id: Uuid) -> AppResult<Option<Bet>>;

    async fn list_bets(&self) -> AppResult<Vec<Bet>>;

    async fn find_bets_by_market_ids(&self, market_ids: &HashSet<Uuid>) -> AppResult<Vec<Bet>>;

    /// Updates name and amount while the bet is pending. Payout fields are never
    /// written here. Errors with `Conflict` once the bet is settled or its market
    /// is resolved.
    async fn update_bet(&self, bet: Bet) -> AppResult<Bet>;

    /// Writes the payout only while the stored margin is still zero.
    /// Errors with `NotFound` if the bet is gone.
    async fn update_bet_payout(
        &self,
        id: Uuid,
        payout_margin: Decimal,
        payout_amount: Decimal,
    ) -> AppResult<PayoutWrite>;

    async fn delete_bet(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> AppResult<()>;
}
