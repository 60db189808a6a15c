// Settlement Scheduler - periodically settles bets on resolved markets
//
// The report endpoint settles on demand; the scheduler makes sure payouts are
// written even when nobody asks for a report. Runs are idempotent, so an
// overlap with an on-demand run is harmless.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use super::engine::SettlementEngine;

/// Settlement scheduler - runs the engine on a fixed interval
pub struct SettlementScheduler {
    period: Duration,
    engine: Arc<SettlementEngine>,
}

impl SettlementScheduler {
    /// Returns None when the interval is zero (scheduler disabled)
    pub fn new(interval_secs: u64, engine: Arc<SettlementEngine>) -> Option<Self> {
        if interval_secs == 0 {
            return None;
        }

        Some(Self {
            period: Duration::from_secs(interval_secs),
            engine,
        })
    }

    /// Start the settlement scheduler (runs in background)
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                info!("🔄 Starting scheduled settlement cycle");

                match self.engine.settle_unreported().await {
                    Ok(report) => info!(
                        "✓ Scheduled settlement: {} won, {} lost, {} flagged",
                        report.winner_count,
                        report.loser_count,
                        report.flagged.len()
                    ),
                    Err(e) => error!("❌ Scheduled settlement failed: {:?}", e),
                }
            }
        })
    }
}
