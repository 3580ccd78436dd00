use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;
use crate::startup::AppState;

/// Liveness. Always 200 while the process serves; dependency state is reported, not enforced.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match &state.store {
        Some(store) => match store.health_check().await {
            Ok(_) => "up",
            Err(_) => "down",
        },
        None => "disconnected",
    };
    let smtp = if state.config.smtp.credentials().is_some() {
        "configured"
    } else {
        "missing_credentials"
    };
    let status = if storage == "up" && smtp == "configured" {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": state.config.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "mongodb": storage,
            "smtp": smtp
        }
    }))
}

/// Readiness: the status store must answer a ping.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.store {
        Some(store) => match store.health_check().await {
            Ok(_) => StatusCode::OK,
            Err(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
