//! HTTP request handlers.

use super::AppState;
use crate::data;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use serde_json::json;

// ============================================================================
// Templates (simple string replacement, no template engine needed)
// ============================================================================

const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");

// ============================================================================
// Dashboard
// ============================================================================

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.controller.snapshot();
    let data_json = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    let mode = if state.backend.is_configured() {
        "production"
    } else {
        "demo"
    };

    let content = DASHBOARD_TEMPLATE
        .replace("{{data_json}}", &data_json)
        .replace("{{mode}}", mode)
        .replace("{{refresh_ms}}", &state.config.refresh_ms.to_string());

    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "HelioWatch Dashboard")
        .replace("{{content}}", &content);

    Html(page)
}

// ============================================================================
// API: Data
// ============================================================================

pub async fn handle_get_data(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.snapshot())
}

pub async fn handle_get_stations(State(state): State<AppState>) -> impl IntoResponse {
    let stations = data::all_stations(state.backend.as_ref()).await;
    Json(stations)
}

// ============================================================================
// API: Data initialization
// ============================================================================

pub async fn handle_init_data_info(State(state): State<AppState>) -> impl IntoResponse {
    let configured = state.backend.is_configured();
    Json(json!({
        "message": "HelioWatch data initialization endpoint",
        "method": "POST",
        "mode": if configured { "production" } else { "demo" },
        "configured": configured,
    }))
}

pub async fn handle_init_data(State(state): State<AppState>) -> impl IntoResponse {
    if !state.backend.is_configured() {
        return Json(json!({
            "success": false,
            "message": "Running in demo mode, no data initialization needed",
            "mode": "demo",
        }))
        .into_response();
    }

    match data::seed_backend_data(state.backend.as_ref()).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Telemetry data generated",
            "mode": "production",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Data initialization failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "message": "Data generation failed, check backend configuration",
                })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_favicon() -> impl IntoResponse {
    // Return a simple SVG favicon
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="20" fill="#f5a623"/>
        <g stroke="#f5a623" stroke-width="6">
            <line x1="50" y1="5" x2="50" y2="22"/>
            <line x1="50" y1="78" x2="50" y2="95"/>
            <line x1="5" y1="50" x2="22" y2="50"/>
            <line x1="78" y1="50" x2="95" y2="50"/>
        </g>
    </svg>"##;

    ([(axum::http::header::CONTENT_TYPE, "image/svg+xml")], svg)
}
