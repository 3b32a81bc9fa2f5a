//! Risk analysis endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use paper_advisor::Risk;

use crate::AppState;

/// Request body for risk analysis
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub description: String,
}

/// Response with identified risks
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub risks: Vec<Risk>,
}

/// Create analyze routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}

/// Identify hedgeable risks for a business description
///
/// Advisor trouble degrades to a fixed "unavailable" risk so the frontend
/// always has something to render.
async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    info!(
        "Analyzing business description ({} chars)",
        body.description.len()
    );

    let risks = match state.advisor.analyze(&body.description).await {
        Ok(risks) => risks,
        Err(e) => {
            error!("Risk analysis failed: {}", e);
            vec![Risk {
                id: "risk-1".to_string(),
                name: "Analysis Unavailable".to_string(),
                likelihood: "Medium".to_string(),
                impact: "Moderate".to_string(),
                description: "The AI risk engine encountered an error. Please try again."
                    .to_string(),
            }]
        }
    };

    (StatusCode::OK, Json(AnalyzeResponse { risks }))
}
