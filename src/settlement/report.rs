use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::bets::models::{Bet, BetStatus};
use crate::markets::models::Outcome;

/// A bet as it stands after settlement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledBet {
    pub id: Uuid,
    pub market_id: Uuid,
    pub chosen_outcome: Outcome,
    pub amount: Decimal,
    pub payout_amount: Decimal,
    pub status: BetStatus,
}

impl SettledBet {
    fn from_bet(bet: Bet, status: BetStatus) -> Self {
        Self {
            id: bet.id,
            market_id: bet.market_id,
            chosen_outcome: bet.chosen_outcome,
            amount: bet.amount,
            payout_amount: bet.payout_amount,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlagReason {
    InvalidOddsData { probability: Decimal },
    PayoutOverflow,
}

/// A winning bet that could not be paid out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedBet {
    pub id: Uuid,
    pub market_id: Uuid,
    pub reason: FlagReason,
}

/// Totals of one settlement run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateReport {
    pub winner_count: usize,
    pub loser_count: usize,
    /// Sum of the losing stakes
    pub total_paid_in: Decimal,
    /// Sum of the winners' net payouts
    pub total_winnings: Decimal,
    pub settled: Vec<SettledBet>,
    pub flagged: Vec<FlaggedBet>,
}

impl AggregateReport {
    pub(crate) fn record_win(&mut self, bet: Bet) {
        self.winner_count += 1;
        self.total_winnings += bet.payout_amount;
        self.settled.push(SettledBet::from_bet(bet, BetStatus::Won));
    }

    pub(crate) fn record_loss(&mut self, bet: Bet) {
        self.loser_count += 1;
        self.total_paid_in += bet.amount;
        self.settled.push(SettledBet::from_bet(bet, BetStatus::Lost));
    }

    pub(crate) fn record_flag(&mut self, bet: &Bet, reason: FlagReason) {
        self.flagged.push(FlaggedBet {
            id: bet.id,
            market_id: bet.market_id,
            reason,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartPoint {
    Count(usize),
    Amount(Decimal),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: &'static str,
    pub labels: [&'static str; 2],
    pub data: [ChartPoint; 2],
}

/// Chart-ready payload returned by the report endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartReport {
    pub charts: Vec<Chart>,
    pub data: Vec<SettledBet>,
    pub flagged: Vec<FlaggedBet>,
}

impl From<AggregateReport> for ChartReport {
    fn from(report: AggregateReport) -> Self {
        let charts = vec![
            Chart {
                title: "Winning Bets vs Losing Bets",
                labels: ["Pay In Bets", "Pay Out Bets"],
                data: [
                    ChartPoint::Count(report.loser_count),
                    ChartPoint::Count(report.winner_count),
                ],
            },
            Chart {
                title: "Pay out Amount vs Pay in Amount",
                labels: ["Pay In Amount", "Pay Out Amount"],
                data: [
                    ChartPoint::Amount(report.total_paid_in),
                    ChartPoint::Amount(report.total_winnings),
                ],
            },
        ];

        Self {
            charts,
            data: report.settled,
            flagged: report.flagged,
        }
    }
}
