//! Paper Risk Engine API Server
//!
//! HTTP API for conversational market search over Kalshi and Polymarket.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paper_advisor::{advisor_from_env, RiskAdvisor};
use paper_core::MarketAdapter;
use paper_kalshi::KalshiClient;
use paper_polymarket::PolymarketClient;
use paper_services::{
    ConversationService, DispatchConfig, MarketAggregator, SessionStore, ToolDispatcher,
    DEFAULT_MAX_RESULTS, DEFAULT_SESSION_TTL_SECS,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub conversation: Arc<ConversationService>,
    pub advisor: Arc<dyn RiskAdvisor>,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables, local overrides first
    for file in [".env.local", ".env"] {
        if let Err(e) = dotenvy::from_filename(file) {
            // Not an error if the file doesn't exist
            if !matches!(e, dotenvy::Error::Io(_)) {
                eprintln!("Warning: Failed to load {}: {}", file, e);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,paper_api=debug")),
        )
        .init();

    info!("Starting Paper Risk Engine API");

    // Initialize provider adapters, with optional upstream overrides
    let kalshi = match std::env::var("KALSHI_API_BASE") {
        Ok(base) => KalshiClient::with_base_url(base),
        Err(_) => KalshiClient::new(),
    };
    let polymarket = match std::env::var("POLYMARKET_API_BASE") {
        Ok(base) => PolymarketClient::with_base_url(base),
        Err(_) => PolymarketClient::new(),
    };
    let adapters: Vec<Arc<dyn MarketAdapter>> = vec![Arc::new(kalshi), Arc::new(polymarket)];

    // Initialize the dispatcher with configured limits
    let max_results = env_parse("MAX_MARKET_RESULTS", DEFAULT_MAX_RESULTS);
    let config = DispatchConfig {
        provider_timeout: Duration::from_secs(env_parse("PROVIDER_TIMEOUT_SECS", 5)),
        intent_timeout: Duration::from_secs(env_parse("INTENT_TIMEOUT_SECS", 8)),
    };
    let dispatcher = Arc::new(
        ToolDispatcher::new(adapters, MarketAggregator::with_max_results(max_results))
            .with_config(config),
    );

    // Initialize the session store and its background sweeper
    let ttl_secs = env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS);
    let sessions = Arc::new(SessionStore::new(ttl_secs));
    sessions.spawn_sweeper();

    // Pick the advisor (Gemini when configured, keyword fallback otherwise)
    let advisor = advisor_from_env();

    let conversation = Arc::new(ConversationService::new(
        Arc::clone(&sessions),
        Arc::clone(&dispatcher),
        Arc::clone(&advisor),
    ));

    // Create app state
    let state = AppState {
        sessions,
        dispatcher,
        conversation,
        advisor,
    };

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = Router::new()
        .merge(routes::api_routes())
        .layer(cors)
        .with_state(state);

    // Start server
    let port: u16 = env_parse("SERVER_PORT", 8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
