//! Health / heartbeat endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::schemas::convert::Environment;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Heartbeat endpoint.
///
/// Returns the version and which environments can serve fetch requests.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let environments: Vec<String> = [Environment::Production, Environment::Development]
        .into_iter()
        .filter(|env| state.config.base_url(*env).is_some())
        .map(|env| env.to_string())
        .collect();

    Json(json!({
        "status":       "ok",
        "version":      env!("CARGO_PKG_VERSION"),
        "environments": environments,
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
