//! Static dashboard and portfolio views
//!
//! Fixture payloads for surfaces the backend does not compute yet. Field
//! names stay camelCase for the frontend.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
struct Kpi {
    label: &'static str,
    value: &'static str,
    change: &'static str,
    safe: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveRisk {
    id: u32,
    name: &'static str,
    probability: &'static str,
    impact: &'static str,
    hedge_status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    kpis: Vec<Kpi>,
    active_risks: Vec<ActiveRisk>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Position {
    id: u32,
    market: &'static str,
    side: &'static str,
    shares: u32,
    avg_price: &'static str,
    current_price: &'static str,
    pnl: &'static str,
    pnl_percent: &'static str,
    is_positive: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioSummary {
    total_value: &'static str,
    all_time_return: &'static str,
}

#[derive(Debug, Serialize)]
struct PortfolioResponse {
    summary: PortfolioSummary,
    positions: Vec<Position>,
}

/// Create fixture routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/portfolio", get(portfolio))
}

async fn dashboard() -> Json<DashboardResponse> {
    let kpis = vec![
        Kpi {
            label: "Active Risks",
            value: "7",
            change: "+2",
            safe: false,
        },
        Kpi {
            label: "Hedged Value",
            value: "$42,500",
            change: "+12%",
            safe: true,
        },
        Kpi {
            label: "Portfolio ROI",
            value: "+8.4%",
            change: "vs Last Month",
            safe: true,
        },
    ];

    let active_risks = vec![
        ActiveRisk {
            id: 1,
            name: "Coffee Futures (KC)",
            probability: "78%",
            impact: "High",
            hedge_status: "Partially Hedged",
        },
        ActiveRisk {
            id: 2,
            name: "Port Strike (East Coast)",
            probability: "45%",
            impact: "Severe",
            hedge_status: "Unhedged",
        },
        ActiveRisk {
            id: 3,
            name: "Inflation Rate > 3.5%",
            probability: "30%",
            impact: "Moderate",
            hedge_status: "Fully Hedged",
        },
    ];

    Json(DashboardResponse { kpis, active_risks })
}

async fn portfolio() -> Json<PortfolioResponse> {
    let summary = PortfolioSummary {
        total_value: "$42,500",
        all_time_return: "+8.4% All Time",
    };

    let positions = vec![
        Position {
            id: 1,
            market: "Coffee Bean Shortage Q3",
            side: "YES",
            shares: 1500,
            avg_price: "$0.42",
            current_price: "$0.55",
            pnl: "+$195.00",
            pnl_percent: "+31%",
            is_positive: true,
        },
        Position {
            id: 2,
            market: "US Inflation < 3.0%",
            side: "NO",
            shares: 500,
            avg_price: "$0.30",
            current_price: "$0.28",
            pnl: "-$10.00",
            pnl_percent: "-6.6%",
            is_positive: false,
        },
        Position {
            id: 3,
            market: "Panama Canal Restrictions",
            side: "YES",
            shares: 2000,
            avg_price: "$0.60",
            current_price: "$0.65",
            pnl: "+$100.00",
            pnl_percent: "+8.3%",
            is_positive: true,
        },
    ];

    Json(PortfolioResponse { summary, positions })
}
