pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use traits::{AuditStore, BetStore, EventStore, MarketStore, PayoutWrite, Resolution};
