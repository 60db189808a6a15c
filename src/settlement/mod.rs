// Bet settlement: payout math, the settlement engine and its chart report
pub mod engine;
pub mod payout;
pub mod report;
pub mod scheduler;

pub use engine::{SettlementConfig, SettlementEngine};
pub use report::{AggregateReport, ChartReport};
pub use scheduler::SettlementScheduler;
