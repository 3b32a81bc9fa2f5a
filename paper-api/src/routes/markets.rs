//! Direct market search endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use paper_core::{MarketContract, ProviderSelector, SearchIntent};

use crate::AppState;

/// Query parameters for listing markets
#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    /// Free-text filter over market titles
    pub query: Option<String>,
    /// "all" (default) or a single provider
    pub provider: Option<String>,
}

/// Response for listing markets
#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub markets: Vec<MarketContract>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create market routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/markets", get(list_markets))
}

/// Search markets outside a conversation
async fn list_markets(
    State(state): State<AppState>,
    Query(params): Query<MarketsQuery>,
) -> impl IntoResponse {
    let selector = match params
        .provider
        .as_deref()
        .unwrap_or("all")
        .parse::<ProviderSelector>()
    {
        Ok(selector) => selector,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };
    let query = params.query.unwrap_or_default();
    info!("Listing markets: provider={} query=\"{}\"", selector, query);

    let intent = SearchIntent::new(selector, query);
    match state.dispatcher.dispatch(&intent).await {
        Ok(outcome) => match outcome.failure {
            Some(reason) => {
                error!("Market search unavailable: {}", reason);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse { error: reason }),
                )
                    .into_response()
            }
            None => (
                StatusCode::OK,
                Json(MarketsResponse {
                    markets: outcome.markets,
                }),
            )
                .into_response(),
        },
        Err(e) => {
            error!("Failed to dispatch market search: {}", e);
            let status = if e.is_client() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
