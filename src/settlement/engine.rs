use futures::{stream, StreamExt, TryStreamExt};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::payout::{self, OddsError};
use super::report::{AggregateReport, FlagReason};
use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::bets::models::Bet;
use crate::error::{AppError, AppResult, SettlementError};
use crate::markets::models::Market;
use crate::store::{BetStore, MarketStore};

/// Settlement engine configuration
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Collection named in the audit entry emitted after each run
    pub audit_collection: String,
    /// Upper bound on every store call
    pub store_timeout: Duration,
    /// Bets settled concurrently within one run
    pub concurrency: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            audit_collection: "bets".to_string(),
            store_timeout: Duration::from_secs(5),
            concurrency: 16,
        }
    }
}

/// What happened to one candidate bet
enum BetOutcome {
    Won(Bet),
    Lost(Bet),
    Flagged(Bet, FlagReason),
    /// Bet has no entry in the market index or disappeared mid-run
    Skipped,
}

pub struct SettlementEngine {
    markets: Arc<dyn MarketStore>,
    bets: Arc<dyn BetStore>,
    audit: AuditSink,
    config: SettlementConfig,
}

impl SettlementEngine {
    pub fn new(
        markets: Arc<dyn MarketStore>,
        bets: Arc<dyn BetStore>,
        audit: AuditSink,
        config: SettlementConfig,
    ) -> Self {
        Self {
            markets,
            bets,
            audit,
            config,
        }
    }

    /// Settle every bet on a resolved market and aggregate the results.
    ///
    /// Safe to call repeatedly and concurrently: payouts are written with a
    /// compare-and-set on the zero margin, so each bet is paid at most once and
    /// later runs reproduce the same totals.
    pub async fn settle(&self) -> AppResult<AggregateReport> {
        self.run(true).await
    }

    /// Same as [`settle`](Self::settle) but without the "Charts info" audit
    /// entry, for runs nobody asked a chart from.
    pub async fn settle_unreported(&self) -> AppResult<AggregateReport> {
        self.run(false).await
    }

    async fn run(&self, audited: bool) -> AppResult<AggregateReport> {
        let markets = self
            .guarded("find_resolved_markets", self.markets.find_resolved_markets())
            .await?;

        let index: HashMap<Uuid, Market> = markets
            .into_iter()
            .filter(Market::is_resolved)
            .map(|m| (m.id, m))
            .collect();

        if index.is_empty() {
            info!("⏭️  No resolved markets, nothing to settle");
            if audited {
                self.notify();
            }
            return Ok(AggregateReport::default());
        }

        let market_ids: HashSet<Uuid> = index.keys().copied().collect();
        let candidates = self
            .guarded(
                "find_bets_by_market_ids",
                self.bets.find_bets_by_market_ids(&market_ids),
            )
            .await?;

        info!(
            "🔄 Settling {} bets across {} resolved markets",
            candidates.len(),
            index.len()
        );

        let outcomes: Vec<BetOutcome> = stream::iter(candidates)
            .map(|bet| self.settle_bet(bet, &index))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let mut report = AggregateReport::default();
        for outcome in outcomes {
            match outcome {
                BetOutcome::Won(bet) => report.record_win(bet),
                BetOutcome::Lost(bet) => report.record_loss(bet),
                BetOutcome::Flagged(bet, reason) => report.record_flag(&bet, reason),
                BetOutcome::Skipped => {}
            }
        }

        info!(
            "✓ Settlement complete: {} won, {} lost, {} flagged",
            report.winner_count,
            report.loser_count,
            report.flagged.len()
        );

        if audited {
            self.notify();
        }
        Ok(report)
    }

    async fn settle_bet(&self, bet: Bet, index: &HashMap<Uuid, Market>) -> AppResult<BetOutcome> {
        let Some(resolved) = index
            .get(&bet.market_id)
            .and_then(|m| m.resolved_outcome.as_ref())
        else {
            warn!("Bet {} references unknown market {}", bet.id, bet.market_id);
            return Ok(BetOutcome::Skipped);
        };

        if bet.chosen_outcome.label != resolved.label {
            return Ok(BetOutcome::Lost(bet));
        }

        if bet.is_settled() {
            return Ok(BetOutcome::Won(bet));
        }

        let quote = match payout::quote(bet.chosen_outcome.probability, bet.amount) {
            Ok(quote) => quote,
            Err(OddsError::NonPositiveProbability(probability)) => {
                warn!("⚠️  Bet {} has invalid odds (probability {})", bet.id, probability);
                return Ok(BetOutcome::Flagged(bet, FlagReason::InvalidOddsData { probability }));
            }
            Err(e @ OddsError::Overflow { .. }) => {
                warn!("⚠️  Bet {} payout not computable: {}", bet.id, e);
                return Ok(BetOutcome::Flagged(bet, FlagReason::PayoutOverflow));
            }
        };

        let write = self
            .timed(
                "update_bet_payout",
                self.bets.update_bet_payout(bet.id, quote.margin, quote.net),
            )
            .await?;

        match write {
            Ok(write) => {
                if write.was_applied() {
                    debug!("💰 Bet {} won {}", bet.id, quote.net);
                } else {
                    debug!("Bet {} was settled by a concurrent run", bet.id);
                }
                Ok(BetOutcome::Won(write.into_bet()))
            }
            Err(AppError::NotFound(_)) => {
                warn!("Bet {} disappeared during settlement", bet.id);
                Ok(BetOutcome::Skipped)
            }
            Err(e) => Err(storage_failure("update_bet_payout", e)),
        }
    }

    fn notify(&self) {
        self.audit.emit(AuditEntry::on_collection(
            AuditAction::ChartsInfo,
            &self.config.audit_collection,
        ));
    }

    /// Bound a store call by the configured timeout
    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<AppResult<T>, SettlementError>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::time::timeout(self.config.store_timeout, call)
            .await
            .map_err(|_| SettlementError::Timeout {
                operation,
                timeout_ms: self.config.store_timeout.as_millis() as u64,
            })
    }

    async fn guarded<T, F>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        self.timed(operation, call)
            .await?
            .map_err(|e| storage_failure(operation, e))
    }
}

fn storage_failure(operation: &'static str, error: AppError) -> AppError {
    SettlementError::StorageFailure {
        operation,
        message: error.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEntry;
    use crate::bets::models::BetStatus;
    use crate::error::AppResult;
    use crate::markets::models::Outcome;
    use crate::store::{InMemoryStore, PayoutWrite, Resolution};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn coin_market() -> Market {
        Market::new(
            "Coin toss".to_string(),
            None,
            vec![Outcome::new("Heads", dec!(0.5)), Outcome::new("Tails", dec!(0.5))],
        )
    }

    fn bet_on(market: &Market, label: &str, probability: Decimal, amount: Decimal) -> Bet {
        Bet::new(Uuid::new_v4(), market.id, None, Outcome::new(label, probability), amount)
    }

    fn engine_for(store: Arc<InMemoryStore>) -> (SettlementEngine, mpsc::Receiver<AuditEntry>) {
        let (sink, rx) = AuditSink::channel(16);
        let engine = SettlementEngine::new(store.clone(), store, sink, SettlementConfig::default());
        (engine, rx)
    }

    struct ScenarioA {
        store: Arc<InMemoryStore>,
        b1: Bet,
        b2: Bet,
    }

    async fn scenario_a() -> ScenarioA {
        let store = Arc::new(InMemoryStore::new());
        let m1 = coin_market();
        store.create_market(m1.clone()).await.unwrap();
        store
            .resolve_market(m1.id, Outcome::new("Heads", dec!(0.5)))
            .await
            .unwrap();

        let b1 = bet_on(&m1, "Heads", dec!(0.5), dec!(100));
        let b2 = bet_on(&m1, "Tails", dec!(0.5), dec!(50));
        store.create_bet(b1.clone()).await.unwrap();
        store.create_bet(b2.clone()).await.unwrap();

        ScenarioA { store, b1, b2 }
    }

    #[tokio::test]
    async fn test_scenario_a_winner_and_loser() {
        let ScenarioA { store, b1, b2 } = scenario_a().await;
        let (engine, _rx) = engine_for(store.clone());

        let report = engine.settle().await.unwrap();

        assert_eq!(report.winner_count, 1);
        assert_eq!(report.loser_count, 1);
        assert_eq!(report.total_paid_in, dec!(50));
        assert_eq!(report.total_winnings, dec!(100));
        assert!(report.flagged.is_empty());

        let b1 = store.find_bet_by_id(b1.id).await.unwrap().unwrap();
        let b2 = store.find_bet_by_id(b2.id).await.unwrap().unwrap();
        assert_eq!(b1.payout_amount, dec!(100));
        assert_eq!(b1.payout_margin, dec!(2));
        assert_eq!(b2.payout_amount, Decimal::ZERO);
        assert_eq!(b2.payout_margin, Decimal::ZERO);

        let won = report.settled.iter().find(|s| s.id == b1.id).unwrap();
        assert_eq!(won.status, BetStatus::Won);
        let lost = report.settled.iter().find(|s| s.id == b2.id).unwrap();
        assert_eq!(lost.status, BetStatus::Lost);
    }

    #[tokio::test]
    async fn test_scenario_b_unresolved_market_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let m2 = coin_market();
        store.create_market(m2.clone()).await.unwrap();
        let b3 = bet_on(&m2, "Heads", dec!(0.5), dec!(10));
        store.create_bet(b3.clone()).await.unwrap();

        let (engine, _rx) = engine_for(store.clone());
        let report = engine.settle().await.unwrap();

        assert_eq!(report, AggregateReport::default());

        let stored = store.find_bet_by_id(b3.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_margin, Decimal::ZERO);
        assert_eq!(stored.payout_amount, Decimal::ZERO);
        assert_eq!(stored.updated_at, b3.updated_at);
    }

    #[tokio::test]
    async fn test_unresolved_bets_excluded_alongside_resolved() {
        let ScenarioA { store, .. } = scenario_a().await;
        let open = coin_market();
        store.create_market(open.clone()).await.unwrap();
        let pending = bet_on(&open, "Heads", dec!(0.5), dec!(10));
        store.create_bet(pending.clone()).await.unwrap();

        let (engine, _rx) = engine_for(store.clone());
        let report = engine.settle().await.unwrap();

        assert_eq!(report.settled.len(), 2);
        assert!(report.settled.iter().all(|s| s.id != pending.id));
        let stored = store.find_bet_by_id(pending.id).await.unwrap().unwrap();
        assert!(!stored.is_settled());
    }

    #[tokio::test]
    async fn test_scenario_c_rerun_is_idempotent() {
        let ScenarioA { store, b1, b2 } = scenario_a().await;
        let (engine, _rx) = engine_for(store.clone());

        let first = engine.settle().await.unwrap();
        let b1_after_first = store.find_bet_by_id(b1.id).await.unwrap().unwrap();

        let second = engine.settle().await.unwrap();
        let b1_after_second = store.find_bet_by_id(b1.id).await.unwrap().unwrap();
        let b2_after_second = store.find_bet_by_id(b2.id).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(b1_after_first.payout_amount, b1_after_second.payout_amount);
        assert_eq!(b1_after_first.payout_margin, b1_after_second.payout_margin);
        assert_eq!(b1_after_first.updated_at, b1_after_second.updated_at);
        assert_eq!(b2_after_second.payout_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_scenario_d_invalid_odds_flagged() {
        let ScenarioA { store, b1, .. } = scenario_a().await;
        let m1 = store.find_market_by_id(b1.market_id).await.unwrap().unwrap();
        let broken = bet_on(&m1, "Heads", Decimal::ZERO, dec!(30));
        store.create_bet(broken.clone()).await.unwrap();

        let (engine, _rx) = engine_for(store.clone());
        let report = engine.settle().await.unwrap();

        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].id, broken.id);
        assert_eq!(
            report.flagged[0].reason,
            FlagReason::InvalidOddsData { probability: Decimal::ZERO }
        );
        assert_eq!(report.winner_count, 1);
        assert_eq!(report.loser_count, 1);
        assert_eq!(report.total_winnings, dec!(100));
        assert!(report.settled.iter().all(|s| s.id != broken.id));

        let stored = store.find_bet_by_id(broken.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_amount, Decimal::ZERO);
        assert!(!stored.is_settled());
    }

    #[tokio::test]
    async fn test_zero_probability_loser_still_counts() {
        let ScenarioA { store, b1, .. } = scenario_a().await;
        let m1 = store.find_market_by_id(b1.market_id).await.unwrap().unwrap();
        store
            .create_bet(bet_on(&m1, "Tails", Decimal::ZERO, dec!(5)))
            .await
            .unwrap();

        let (engine, _rx) = engine_for(store);
        let report = engine.settle().await.unwrap();

        assert!(report.flagged.is_empty());
        assert_eq!(report.loser_count, 2);
        assert_eq!(report.total_paid_in, dec!(55));
    }

    #[tokio::test]
    async fn test_payout_formula_and_totals_hold() {
        let store = Arc::new(InMemoryStore::new());
        let dice = Market::new(
            "Dice".to_string(),
            None,
            (1..=6)
                .map(|n| Outcome::new(n.to_string(), dec!(0.1666)))
                .collect(),
        );
        let other = coin_market();
        store.create_market(dice.clone()).await.unwrap();
        store.create_market(other.clone()).await.unwrap();
        store.resolve_market(dice.id, Outcome::new("6", dec!(0.1666))).await.unwrap();
        store.resolve_market(other.id, Outcome::new("Heads", dec!(0.5))).await.unwrap();

        let bets = vec![
            bet_on(&dice, "6", dec!(0.1666), dec!(12)),
            bet_on(&dice, "6", dec!(0.3), dec!(7.5)),
            bet_on(&dice, "2", dec!(0.1666), dec!(40)),
            // Same label on another market must be judged against that market
            bet_on(&other, "6", dec!(0.5), dec!(9)),
            bet_on(&other, "Heads", dec!(0.45), dec!(20)),
        ];
        for bet in &bets {
            store.create_bet(bet.clone()).await.unwrap();
        }

        let (engine, _rx) = engine_for(store.clone());
        let report = engine.settle().await.unwrap();

        let mut winnings = Decimal::ZERO;
        let mut paid_in = Decimal::ZERO;
        for bet in &bets {
            let stored = store.find_bet_by_id(bet.id).await.unwrap().unwrap();
            let winning_label = if bet.market_id == dice.id { "6" } else { "Heads" };

            if bet.chosen_outcome.label == winning_label {
                let p = bet.chosen_outcome.probability;
                assert_eq!(stored.payout_amount, bet.amount * (Decimal::ONE / p) - bet.amount);
                winnings += stored.payout_amount;
            } else {
                assert_eq!(stored.payout_amount, Decimal::ZERO);
                paid_in += bet.amount;
            }
        }

        assert_eq!(report.winner_count, 3);
        assert_eq!(report.loser_count, 2);
        assert_eq!(report.total_winnings, winnings);
        assert_eq!(report.total_paid_in, paid_in);
    }

    #[tokio::test]
    async fn test_concurrent_runs_pay_once() {
        let ScenarioA { store, b1, .. } = scenario_a().await;
        let (first_engine, _rx1) = engine_for(store.clone());
        let (second_engine, _rx2) = engine_for(store.clone());

        let (first, second) = tokio::join!(first_engine.settle(), second_engine.settle());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.total_winnings, dec!(100));
        assert_eq!(second.total_winnings, dec!(100));

        let stored = store.find_bet_by_id(b1.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_amount, dec!(100));
    }

    #[tokio::test]
    async fn test_emits_charts_info_after_success() {
        let ScenarioA { store, .. } = scenario_a().await;
        let (engine, mut rx) = engine_for(store);

        engine.settle().await.unwrap();

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.action, AuditAction::ChartsInfo);
        assert_eq!(entry.target.collection, "bets");
        assert!(entry.target.id.is_none());
    }

    #[tokio::test]
    async fn test_no_resolved_markets_yields_empty_report() {
        let store = Arc::new(InMemoryStore::new());
        let (engine, mut rx) = engine_for(store);

        let report = engine.settle().await.unwrap();

        assert_eq!(report, AggregateReport::default());
        assert!(rx.try_recv().is_ok());
    }

    /// Delegates to an in-memory store, with injectable faults
    #[derive(Default)]
    struct FaultyStore {
        inner: InMemoryStore,
        fail_markets: bool,
        stall_bets: Option<Duration>,
        fail_payouts: bool,
        /// Bets whose payout write reports them gone
        vanished_bets: HashSet<Uuid>,
    }

    #[async_trait]
    impl MarketStore for FaultyStore {
        async fn create_market(&self, market: Market) -> AppResult<Market> {
            self.inner.create_market(market).await
        }

        async fn find_market_by_id(&self, id: Uuid) -> AppResult<Option<Market>> {
            self.inner.find_market_by_id(id).await
        }

        async fn list_markets(&self) -> AppResult<Vec<Market>> {
            self.inner.list_markets().await
        }

        async fn find_markets_by_event(&self, event_id: Uuid) -> AppResult<Vec<Market>> {
            self.inner.find_markets_by_event(event_id).await
        }

        async fn find_resolved_markets(&self) -> AppResult<Vec<Market>> {
            if self.fail_markets {
                return Err(AppError::Internal("market store offline".to_string()));
            }
            self.inner.find_resolved_markets().await
        }

        async fn update_market(&self, market: Market) -> AppResult<Market> {
            self.inner.update_market(market).await
        }

        async fn resolve_market(&self, id: Uuid, outcome: Outcome) -> AppResult<Option<Resolution>> {
            self.inner.resolve_market(id, outcome).await
        }

        async fn delete_market(&self, id: Uuid) -> AppResult<bool> {
            self.inner.delete_market(id).await
        }
    }

    #[async_trait]
    impl BetStore for FaultyStore {
        async fn create_bet(&self, bet: Bet) -> AppResult<Bet> {
            self.inner.create_bet(bet).await
        }

        async fn find_bet_by_id(&self, id: Uuid) -> AppResult<Option<Bet>> {
            self.inner.find_bet_by_id(id).await
        }

        async fn list_bets(&self) -> AppResult<Vec<Bet>> {
            self.inner.list_bets().await
        }

        async fn find_bets_by_market_ids(&self, market_ids: &HashSet<Uuid>) -> AppResult<Vec<Bet>> {
            if let Some(delay) = self.stall_bets {
                tokio::time::sleep(delay).await;
            }
            self.inner.find_bets_by_market_ids(market_ids).await
        }

        async fn update_bet(&self, bet: Bet) -> AppResult<Bet> {
            self.inner.update_bet(bet).await
        }

        async fn update_bet_payout(
            &self,
            id: Uuid,
            payout_margin: Decimal,
            payout_amount: Decimal,
        ) -> AppResult<PayoutWrite> {
            if self.fail_payouts {
                return Err(AppError::Internal("write rejected".to_string()));
            }
            if self.vanished_bets.contains(&id) {
                return Err(AppError::NotFound(format!("Bet {} not found", id)));
            }
            self.inner.update_bet_payout(id, payout_margin, payout_amount).await
        }

        async fn delete_bet(&self, id: Uuid) -> AppResult<bool> {
            self.inner.delete_bet(id).await
        }
    }

    async fn seed_faulty(store: &FaultyStore) {
        let market = coin_market();
        store.create_market(market.clone()).await.unwrap();
        store
            .resolve_market(market.id, Outcome::new("Heads", dec!(0.5)))
            .await
            .unwrap();
        store
            .create_bet(bet_on(&market, "Heads", dec!(0.5), dec!(100)))
            .await
            .unwrap();
    }

    fn faulty_engine(
        store: Arc<FaultyStore>,
        store_timeout: Duration,
    ) -> (SettlementEngine, mpsc::Receiver<AuditEntry>) {
        let (sink, rx) = AuditSink::channel(16);
        let config = SettlementConfig {
            store_timeout,
            ..SettlementConfig::default()
        };
        (SettlementEngine::new(store.clone(), store, sink, config), rx)
    }

    #[tokio::test]
    async fn test_market_fetch_failure_aborts() {
        let store = FaultyStore {
            fail_markets: true,
            ..FaultyStore::default()
        };
        seed_faulty(&store).await;
        let (engine, mut rx) = faulty_engine(Arc::new(store), Duration::from_secs(5));

        let result = engine.settle().await;

        assert!(matches!(
            result,
            Err(AppError::Settlement(SettlementError::StorageFailure {
                operation: "find_resolved_markets",
                ..
            }))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stalled_bet_fetch_times_out() {
        let store = FaultyStore {
            stall_bets: Some(Duration::from_secs(10)),
            ..FaultyStore::default()
        };
        seed_faulty(&store).await;
        let (engine, _rx) = faulty_engine(Arc::new(store), Duration::from_millis(50));

        let result = engine.settle().await;

        assert!(matches!(
            result,
            Err(AppError::Settlement(SettlementError::Timeout {
                operation: "find_bets_by_market_ids",
                timeout_ms: 50,
            }))
        ));
    }

    #[tokio::test]
    async fn test_payout_write_failure_aborts() {
        let store = FaultyStore {
            fail_payouts: true,
            ..FaultyStore::default()
        };
        seed_faulty(&store).await;
        let (engine, _rx) = faulty_engine(Arc::new(store), Duration::from_secs(5));

        let result = engine.settle().await;

        assert!(matches!(
            result,
            Err(AppError::Settlement(SettlementError::StorageFailure {
                operation: "update_bet_payout",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_overflowing_payout_is_flagged() {
        let store = Arc::new(InMemoryStore::new());
        let market = coin_market();
        store.create_market(market.clone()).await.unwrap();
        store
            .resolve_market(market.id, Outcome::new("Heads", dec!(0.5)))
            .await
            .unwrap();

        let huge = bet_on(&market, "Heads", dec!(0.0000001), Decimal::MAX);
        let winner = bet_on(&market, "Heads", dec!(0.5), dec!(100));
        let loser = bet_on(&market, "Tails", dec!(0.5), dec!(50));
        for bet in [&huge, &winner, &loser] {
            store.create_bet(bet.clone()).await.unwrap();
        }
        let (engine, _rx) = engine_for(store.clone());

        let report = engine.settle().await.unwrap();

        assert_eq!(report.winner_count, 1);
        assert_eq!(report.loser_count, 1);
        assert_eq!(report.total_winnings, dec!(100));
        assert_eq!(report.total_paid_in, dec!(50));
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].id, huge.id);
        assert!(matches!(report.flagged[0].reason, FlagReason::PayoutOverflow));
        assert!(report.settled.iter().all(|s| s.id != huge.id));

        let stored = store.find_bet_by_id(huge.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_margin, Decimal::ZERO);
        assert_eq!(stored.payout_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_bet_gone_before_payout_is_skipped() {
        let market = coin_market();
        let gone = bet_on(&market, "Heads", dec!(0.5), dec!(30));
        let kept = bet_on(&market, "Heads", dec!(0.5), dec!(100));
        let store = FaultyStore {
            vanished_bets: HashSet::from([gone.id]),
            ..FaultyStore::default()
        };
        store.create_market(market.clone()).await.unwrap();
        store
            .resolve_market(market.id, Outcome::new("Heads", dec!(0.5)))
            .await
            .unwrap();
        store.create_bet(gone.clone()).await.unwrap();
        store.create_bet(kept.clone()).await.unwrap();
        let (engine, _rx) = faulty_engine(Arc::new(store), Duration::from_secs(5));

        let report = engine.settle().await.unwrap();

        assert_eq!(report.winner_count, 1);
        assert_eq!(report.loser_count, 0);
        assert_eq!(report.total_winnings, dec!(100));
        assert!(report.flagged.is_empty());
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_unreported_run_settles_without_audit() {
        let ScenarioA { store, b1, .. } = scenario_a().await;
        let (engine, mut rx) = engine_for(store.clone());

        let report = engine.settle_unreported().await.unwrap();

        assert_eq!(report.winner_count, 1);
        assert_eq!(report.total_winnings, dec!(100));
        let stored = store.find_bet_by_id(b1.id).await.unwrap().unwrap();
        assert_eq!(stored.payout_amount, dec!(100));
        assert!(rx.try_recv().is_err());
    }
}
