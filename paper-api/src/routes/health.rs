//! Health check endpoints

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// Root status line, kept stable for the frontend banner
async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Risk Engine Online" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}
