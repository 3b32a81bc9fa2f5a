//! API route definitions

mod analyze;
mod chat;
mod fixtures;
mod health;
mod markets;

use axum::Router;

use crate::AppState;

/// Create all routes, mounted at the root
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(chat::routes())
        .merge(markets::routes())
        .merge(analyze::routes())
        .merge(fixtures::routes())
        .merge(health::routes())
}
