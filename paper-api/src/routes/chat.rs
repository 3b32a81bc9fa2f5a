//! Conversational hedging endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use paper_core::{MarketContract, Message, ToolCallRecord};

use crate::AppState;

/// Request body for one chat turn
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Client's copy of the transcript, reseeds a session the server lost
    #[serde(default)]
    pub messages: Vec<Message>,
    pub message: String,
    pub session_id: String,
}

/// Response for a completed turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<Message>,
    pub markets: Vec<MarketContract>,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create chat routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_turn))
        .route("/chat/{session_id}", delete(drop_session))
}

/// Run one conversation turn
async fn chat_turn(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    info!("Chat turn for session {}", body.session_id);

    match state
        .conversation
        .run_turn(&body.session_id, body.messages, &body.message)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ChatResponse {
                messages: outcome.messages,
                markets: outcome.markets,
                tool_calls: outcome.tool_calls,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Chat turn failed: {}", e);
            let status = if e.is_client() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
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

/// Tear down a session; unknown ids succeed the same way
async fn drop_session(State(state): State<AppState>, Path(session_id): Path<String>) -> StatusCode {
    if state.sessions.drop_session(&session_id) {
        info!("Dropped session {}", session_id);
    }
    StatusCode::NO_CONTENT
}
