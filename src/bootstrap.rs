use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tracing::info;

use crate::{
    api::handler::AppState,
    audit::{spawn_audit_writer, AuditSink},
    config::{Config, StorageBackend},
    error::{AppError, AppResult},
    settlement::{SettlementConfig, SettlementEngine, SettlementScheduler},
    store::{AuditStore, BetStore, EventStore, InMemoryStore, MarketStore, PgStore},
};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let state = match config.storage_backend {
        StorageBackend::Memory => {
            info!("✅ In-memory store initialized");
            assemble_state(Arc::new(InMemoryStore::new()), config)
        }
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                AppError::Config("DATABASE_URL must be set for postgres storage".to_string())
            })?;
            let pool = initialize_database(database_url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            info!("✓ Database initialized");
            assemble_state(Arc::new(store), config)
        }
    };

    if let Some(scheduler) =
        SettlementScheduler::new(config.settlement_interval_secs, state.settlement.clone())
    {
        scheduler.start();
        info!(
            "✅ Settlement scheduler started (every {}s)",
            config.settlement_interval_secs
        );
    }

    Ok(state)
}

/// Wire one store behind every trait and start the audit writer.
/// Must run inside a tokio runtime.
pub fn assemble_state<S>(store: Arc<S>, config: &Config) -> AppState
where
    S: EventStore + MarketStore + BetStore + AuditStore + 'static,
{
    let (audit, audit_rx) = AuditSink::channel(config.audit_channel_capacity);
    spawn_audit_writer(audit_rx, store.clone());
    info!(
        "✅ Audit writer started (channel capacity {})",
        config.audit_channel_capacity
    );

    let settlement_config = SettlementConfig {
        store_timeout: config.store_timeout(),
        concurrency: config.settlement_concurrency.max(1),
        ..SettlementConfig::default()
    };
    let settlement = Arc::new(SettlementEngine::new(
        store.clone(),
        store.clone(),
        audit.clone(),
        settlement_config,
    ));
    info!("✅ Settlement engine initialized");

    AppState {
        events: store.clone(),
        markets: store.clone(),
        bets: store,
        settlement,
        audit,
        storage_backend: config.storage_backend.as_str(),
    }
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(50)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("✓ Database pool configured: 50 max connections");
    Ok(pool)
}
