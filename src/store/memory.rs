use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{AuditStore, BetStore, EventStore, MarketStore, PayoutWrite, Resolution};
use crate::audit::AuditEntry;
use crate::bets::models::Bet;
use crate::error::{AppError, AppResult};
use crate::events::models::Event;
use crate::markets::models::{Market, Outcome};

/// In-process store used for development and tests
pub struct InMemoryStore {
    events: RwLock<HashMap<Uuid, Event>>,
    markets: RwLock<HashMap<Uuid, Market>>,
    bets: RwLock<HashMap<Uuid, Bet>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            markets: RwLock::new(HashMap::new()),
            bets: RwLock::new(HashMap::new()),
            audit: RwLock::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn create_event(&self, event: Event) -> AppResult<Event> {
        let mut events = self.events.write().await;
        events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list_events(&self) -> AppResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut all: Vec<_> = events.values().cloned().collect();
        all.sort_by_key(|e| (e.created_at, e.id));
        Ok(all)
    }

    async fn update_event(&self, event: Event) -> AppResult<Event> {
        let mut events = self.events.write().await;
        let stored = events
            .get_mut(&event.id)
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event.id)))?;

        stored.name = event.name;
        stored.description = event.description;
        stored.start_date = event.start_date;
        stored.end_date = event.end_date;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete_event(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.events.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn create_market(&self, market: Market) -> AppResult<Market> {
        let mut markets = self.markets.write().await;
        markets.insert(market.id, market.clone());
        Ok(market)
    }

    async fn find_market_by_id(&self, id: Uuid) -> AppResult<Option<Market>> {
        Ok(self.markets.read().await.get(&id).cloned())
    }

    async fn list_markets(&self) -> AppResult<Vec<Market>> {
        let markets = self.markets.read().await;
        let mut all: Vec<_> = markets.values().cloned().collect();
        all.sort_by_key(|m| (m.created_at, m.id));
        Ok(all)
    }

    async fn find_markets_by_event(&self, event_id: Uuid) -> AppResult<Vec<Market>> {
        let markets = self.markets.read().await;
        let mut found: Vec<_> = markets
            .values()
            .filter(|m| m.event_id == Some(event_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.created_at, m.id));
        Ok(found)
    }

    async fn find_resolved_markets(&self) -> AppResult<Vec<Market>> {
        let markets = self.markets.read().await;
        let mut resolved: Vec<_> = markets
            .values()
            .filter(|m| m.is_resolved())
            .cloned()
            .collect();
        resolved.sort_by_key(|m| (m.created_at, m.id));
        Ok(resolved)
    }

    async fn update_market(&self, market: Market) -> AppResult<Market> {
        let mut markets = self.markets.write().await;
        let stored = markets
            .get_mut(&market.id)
            .ok_or_else(|| AppError::NotFound(format!("Market {} not found", market.id)))?;

        stored.name = market.name;
        stored.possible_outcomes = market.possible_outcomes;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn resolve_market(&self, id: Uuid, outcome: Outcome) -> AppResult<Option<Resolution>> {
        let mut markets = self.markets.write().await;
        let Some(stored) = markets.get_mut(&id) else {
            return Ok(None);
        };

        if stored.is_resolved() {
            return Ok(Some(Resolution::AlreadyResolved(stored.clone())));
        }

        let resolved = stored.clone().resolved_with(outcome);
        *stored = resolved.clone();
        Ok(Some(Resolution::Resolved(resolved)))
    }

    async fn delete_market(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.markets.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl BetStore for InMemoryStore {
    async fn create_bet(&self, bet: Bet) -> AppResult<Bet> {
        let mut bets = self.bets.write().await;
        bets.insert(bet.id, bet.clone());
        Ok(bet)
    }

    async fn find_bet_by_id(&self, id: Uuid) -> AppResult<Option<Bet>> {
        Ok(self.bets.read().await.get(&id).cloned())
    }

    async fn list_bets(&self) -> AppResult<Vec<Bet>> {
        let bets = self.bets.read().await;
        let mut all: Vec<_> = bets.values().cloned().collect();
        all.sort_by_key(|b| (b.created_at, b.id));
        Ok(all)
    }

    async fn find_bets_by_market_ids(&self, market_ids: &HashSet<Uuid>) -> AppResult<Vec<Bet>> {
        let bets = self.bets.read().await;
        let mut found: Vec<_> = bets
            .values()
            .filter(|b| market_ids.contains(&b.market_id))
            .cloned()
            .collect();
        found.sort_by_key(|b| (b.created_at, b.id));
        Ok(found)
    }

    async fn update_bet(&self, bet: Bet) -> AppResult<Bet> {
        // Markets before bets; resolution waits until the edit lands
        let markets = self.markets.read().await;
        let mut bets = self.bets.write().await;
        let stored = bets
            .get_mut(&bet.id)
            .ok_or_else(|| AppError::NotFound(format!("Bet {} not found", bet.id)))?;

        let market_resolved = markets
            .get(&stored.market_id)
            .is_some_and(Market::is_resolved);
        if stored.is_settled() || market_resolved {
            return Err(AppError::Conflict(format!(
                "Bet {} is no longer pending",
                bet.id
            )));
        }

        stored.name = bet.name;
        stored.amount = bet.amount;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn update_bet_payout(
        &self,
        id: Uuid,
        payout_margin: Decimal,
        payout_amount: Decimal,
    ) -> AppResult<PayoutWrite> {
        let mut bets = self.bets.write().await;
        let stored = bets
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Bet {} not found", id)))?;

        if stored.is_settled() {
            return Ok(PayoutWrite::AlreadySettled(stored.clone()));
        }

        stored.payout_margin = payout_margin;
        stored.payout_amount = payout_amount;
        stored.updated_at = Utc::now();

        Ok(PayoutWrite::Applied(stored.clone()))
    }

    async fn delete_bet(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.bets.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn record(&self, entry: AuditEntry) -> AppResult<()> {
        self.audit.write().await.push(entry);
        Ok(())
    }
}
