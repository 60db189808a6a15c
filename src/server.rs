use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{health_check, AppState},
    bets::handlers::{create_bet, delete_bet, get_bet, get_chart_report, list_bets, update_bet},
    config::Config,
    events::handlers::{create_event, delete_event, get_event, list_events, update_event},
    markets::handlers::{
        create_market, delete_market, get_market, get_markets_by_event, list_markets,
        resolve_market, update_market,
    },
    middleware::create_cors_layer,
};

pub fn create_app(state: AppState, config: &Config) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                // Events
                .route("/events", post(create_event).get(list_events))
                .route(
                    "/events/:id",
                    get(get_event).put(update_event).delete(delete_event),
                )
                // Markets
                .route("/markets", post(create_market).get(list_markets))
                .route(
                    "/markets/:id",
                    get(get_market).put(update_market).delete(delete_market),
                )
                .route("/markets/by-event/:id", get(get_markets_by_event))
                .route("/markets/:id/resolve", post(resolve_market))
                // Bets
                .route("/bets", post(create_bet).get(list_bets))
                .route("/bets/report", get(get_chart_report))
                .route("/bets/:id", get(get_bet).put(update_bet).delete(delete_bet)),
        )
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(create_cors_layer(&config.cors_origins()))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
