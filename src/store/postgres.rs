use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{prelude::FromRow, types::Json, PgPool};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use super::traits::{AuditStore, BetStore, EventStore, MarketStore, PayoutWrite, Resolution};
use crate::audit::AuditEntry;
use crate::bets::models::Bet;
use crate::error::{AppError, AppResult};
use crate::events::models::Event;
use crate::markets::models::{Market, Outcome};

/// Postgres-backed store - the source of truth in production
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> AppResult<()> {
        info!("🔄 Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MarketRow {
    id: Uuid,
    name: String,
    event_id: Option<Uuid>,
    possible_outcomes: Json<Vec<Outcome>>,
    resolved_outcome_label: Option<String>,
    resolved_outcome_probability: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MarketRow> for Market {
    fn from(row: MarketRow) -> Self {
        let resolved_outcome = match (row.resolved_outcome_label, row.resolved_outcome_probability) {
            (Some(label), Some(probability)) => Some(Outcome::new(label, probability)),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            event_id: row.event_id,
            possible_outcomes: row.possible_outcomes.0,
            resolved_outcome,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BetRow {
    id: Uuid,
    event_id: Uuid,
    market_id: Uuid,
    name: Option<String>,
    chosen_outcome_label: String,
    chosen_outcome_probability: Decimal,
    amount: Decimal,
    payout_margin: Decimal,
    payout_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BetRow> for Bet {
    fn from(row: BetRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            market_id: row.market_id,
            name: row.name,
            chosen_outcome: Outcome::new(row.chosen_outcome_label, row.chosen_outcome_probability),
            amount: row.amount,
            payout_margin: row.payout_margin,
            payout_amount: row.payout_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ========== EVENTS ==========

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, event: Event) -> AppResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (id, name, description, start_date, end_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_event_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, name, description, start_date, end_date, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_events(&self) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, name, description, start_date, end_date, created_at, updated_at
            FROM events
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_event(&self, event: Event) -> AppResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET name = $2, description = $3, start_date = $4, end_date = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, start_date, end_date, created_at, updated_at
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event.id)))?;

        Ok(row.into())
    }

    async fn delete_event(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ========== MARKETS ==========

#[async_trait]
impl MarketStore for PgStore {
    async fn create_market(&self, market: Market) -> AppResult<Market> {
        let row = sqlx::query_as::<_, MarketRow>(
            r#"
            INSERT INTO markets (id, name, event_id, possible_outcomes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, event_id, possible_outcomes,
                      resolved_outcome_label, resolved_outcome_probability,
                      created_at, updated_at
            "#,
        )
        .bind(market.id)
        .bind(&market.name)
        .bind(market.event_id)
        .bind(Json(&market.possible_outcomes))
        .bind(market.created_at)
        .bind(market.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_market_by_id(&self, id: Uuid) -> AppResult<Option<Market>> {
        let row = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, name, event_id, possible_outcomes,
                   resolved_outcome_label, resolved_outcome_probability,
                   created_at, updated_at
            FROM markets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_markets(&self) -> AppResult<Vec<Market>> {
        let rows = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, name, event_id, possible_outcomes,
                   resolved_outcome_label, resolved_outcome_probability,
                   created_at, updated_at
            FROM markets
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_markets_by_event(&self, event_id: Uuid) -> AppResult<Vec<Market>> {
        let rows = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, name, event_id, possible_outcomes,
                   resolved_outcome_label, resolved_outcome_probability,
                   created_at, updated_at
            FROM markets
            WHERE event_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_resolved_markets(&self) -> AppResult<Vec<Market>> {
        let rows = sqlx::query_as::<_, MarketRow>(
            r#"
            SELECT id, name, event_id, possible_outcomes,
                   resolved_outcome_label, resolved_outcome_probability,
                   created_at, updated_at
            FROM markets
            WHERE resolved_outcome_label IS NOT NULL
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_market(&self, market: Market) -> AppResult<Market> {
        let row = sqlx::query_as::<_, MarketRow>(
            r#"
            UPDATE markets
            SET name = $2, possible_outcomes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, event_id, possible_outcomes,
                      resolved_outcome_label, resolved_outcome_probability,
                      created_at, updated_at
            "#,
        )
        .bind(market.id)
        .bind(&market.name)
        .bind(Json(&market.possible_outcomes))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Market {} not found", market.id)))?;

        Ok(row.into())
    }

    async fn resolve_market(&self, id: Uuid, outcome: Outcome) -> AppResult<Option<Resolution>> {
        let resolved = sqlx::query_as::<_, MarketRow>(
            r#"
            UPDATE markets
            SET resolved_outcome_label = $2, resolved_outcome_probability = $3, updated_at = NOW()
            WHERE id = $1 AND resolved_outcome_label IS NULL
            RETURNING id, name, event_id, possible_outcomes,
                      resolved_outcome_label, resolved_outcome_probability,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&outcome.label)
        .bind(outcome.probability)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = resolved {
            return Ok(Some(Resolution::Resolved(row.into())));
        }

        Ok(self
            .find_market_by_id(id)
            .await?
            .map(Resolution::AlreadyResolved))
    }

    async fn delete_market(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM markets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ========== BETS ==========

#[async_trait]
impl BetStore for PgStore {
    async fn create_bet(&self, bet: Bet) -> AppResult<Bet> {
        let row = sqlx::query_as::<_, BetRow>(
            r#"
            INSERT INTO bets (
                id, event_id, market_id, name,
                chosen_outcome_label, chosen_outcome_probability,
                amount, payout_margin, payout_amount, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, event_id, market_id, name,
                      chosen_outcome_label, chosen_outcome_probability,
                      amount, payout_margin, payout_amount, created_at, updated_at
            "#,
        )
        .bind(bet.id)
        .bind(bet.event_id)
        .bind(bet.market_id)
        .bind(&bet.name)
        .bind(&bet.chosen_outcome.label)
        .bind(bet.chosen_outcome.probability)
        .bind(bet.amount)
        .bind(bet.payout_margin)
        .bind(bet.payout_amount)
        .bind(bet.created_at)
        .bind(bet.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_bet_by_id(&self, id: Uuid) -> AppResult<Option<Bet>> {
        let row = sqlx::query_as::<_, BetRow>(
            r#"
            SELECT id, event_id, market_id, name,
                   chosen_outcome_label, chosen_outcome_probability,
                   amount, payout_margin, payout_amount, created_at, updated_at
            FROM bets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_bets(&self) -> AppResult<Vec<Bet>> {
        let rows = sqlx::query_as::<_, BetRow>(
            r#"
            SELECT id, event_id, market_id, name,
                   chosen_outcome_label, chosen_outcome_probability,
                   amount, payout_margin, payout_amount, created_at, updated_at
            FROM bets
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_bets_by_market_ids(&self, market_ids: &HashSet<Uuid>) -> AppResult<Vec<Bet>> {
        if market_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = market_ids.iter().copied().collect();
        let rows = sqlx::query_as::<_, BetRow>(
            r#"
            SELECT id, event_id, market_id, name,
                   chosen_outcome_label, chosen_outcome_probability,
                   amount, payout_margin, payout_amount, created_at, updated_at
            FROM bets
            WHERE market_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_bet(&self, bet: Bet) -> AppResult<Bet> {
        let row = sqlx::query_as::<_, BetRow>(
            r#"
            UPDATE bets
            SET name = $2, amount = $3, updated_at = NOW()
            WHERE id = $1
              AND payout_margin = 0
              AND NOT EXISTS (
                  SELECT 1 FROM markets m
                  WHERE m.id = bets.market_id AND m.resolved_outcome_label IS NOT NULL
              )
            RETURNING id, event_id, market_id, name,
                      chosen_outcome_label, chosen_outcome_probability,
                      amount, payout_margin, payout_amount, created_at, updated_at
            "#,
        )
        .bind(bet.id)
        .bind(&bet.name)
        .bind(bet.amount)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        match self.find_bet_by_id(bet.id).await? {
            Some(_) => Err(AppError::Conflict(format!(
                "Bet {} is no longer pending",
                bet.id
            ))),
            None => Err(AppError::NotFound(format!("Bet {} not found", bet.id))),
        }
    }

    async fn update_bet_payout(
        &self,
        id: Uuid,
        payout_margin: Decimal,
        payout_amount: Decimal,
    ) -> AppResult<PayoutWrite> {
        // Single-statement compare-and-set on the default margin
        let applied = sqlx::query_as::<_, BetRow>(
            r#"
            UPDATE bets
            SET payout_margin = $2, payout_amount = $3, updated_at = NOW()
            WHERE id = $1 AND payout_margin = 0
            RETURNING id, event_id, market_id, name,
                      chosen_outcome_label, chosen_outcome_probability,
                      amount, payout_margin, payout_amount, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payout_margin)
        .bind(payout_amount)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = applied {
            return Ok(PayoutWrite::Applied(row.into()));
        }

        self.find_bet_by_id(id)
            .await?
            .map(PayoutWrite::AlreadySettled)
            .ok_or_else(|| AppError::NotFound(format!("Bet {} not found", id)))
    }

    async fn delete_bet(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ========== AUDIT ==========

#[async_trait]
impl AuditStore for PgStore {
    async fn record(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, target_collection, target_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.target.collection)
        .bind(&entry.target.id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
