use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::ServerError;
use crate::state::AppState;

pub static X_AUTH_KEY: &str = "x-auth-key";

/// Reject requests whose `X-Auth-Key` differs from the configured key.
///
/// An empty configured key turns the check off.
pub async fn require_auth_key(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.auth_key.as_str();
    if !expected.is_empty() {
        let provided = req.headers().get(X_AUTH_KEY).and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!(key_present = provided.is_some(), "rejected request: invalid auth key");
            return ServerError::Unauthorized.into_response();
        }
    }
    next.run(req).await
}
