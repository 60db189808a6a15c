mod api;
mod audit;
mod bets;
mod bootstrap;
mod config;
mod error;
mod events;
mod markets;
mod middleware;
mod server;
mod settlement;
mod store;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,betting_backend=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("🚀 Starting Betting Backend");

    // Load configuration
    let config = config::Config::from_env()?;
    info!(
        "📋 Storage: {}, settlement interval: {}s",
        config.storage_backend.as_str(),
        config.settlement_interval_secs
    );

    let state = bootstrap::initialize_app_state(&config).await?;

    // Create HTTP server
    let app = server::create_app(state, &config);

    // Run the Server
    server::run_server(app, &config.bind_address).await?;

    Ok(())
}
