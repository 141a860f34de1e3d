//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - per-request trace-ID middleware
//! - `GET /health` (no auth)
//! - `POST /` conversion endpoint (auth-key protected)
//! - optional `GET /api-docs/openapi.json` (disable with `REMUX_ENABLE_DOCS=false`)

pub mod convert;
pub mod doc;
mod health;

use std::sync::Arc;

use axum::{Router, middleware};

use crate::middleware::trace;
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(convert::router(Arc::clone(&state)));

    if state.config.enable_docs {
        app = app.merge(doc::router());
    }

    app.layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
