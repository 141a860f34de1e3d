//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become plain-text HTTP
//! responses with an appropriate status code.
//!
//! Internal errors (ffmpeg, I/O) are logged with full detail but only a
//! generic message is returned, so paths and tool output never reach callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use remux_fetch::FetchError;
use remux_ffmpeg::RemuxError;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the remux-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or wrong `X-Auth-Key`.
    #[error("invalid key")]
    Unauthorized,

    /// Unsupported representation or malformed body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The source could not be downloaded within the retry budget.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    /// The request needs configuration the operator has not provided.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// ffmpeg failed or timed out.
    #[error("remux failed: {0}")]
    Remux(#[from] RemuxError),

    /// Scratch-space I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid key".to_owned()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::NotConfigured(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),

            // Upstream diagnostics are the caller's own data; pass them through.
            ServerError::Upstream(FetchError::Exhausted {
                status,
                body,
                attempts,
            }) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream fetch failed after {attempts} attempt(s) with status {status}: {body}"),
            ),
            ServerError::Upstream(FetchError::Transport { source, attempts }) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream fetch failed after {attempts} attempt(s): {source}"),
            ),

            // Internal errors: log the full detail, return a generic message.
            ServerError::Upstream(e @ FetchError::Client(_)) => {
                error!(error = %e, "fetch client error");
                internal()
            }
            ServerError::Remux(e) => {
                error!(error = %e, "remux failed");
                internal()
            }
            ServerError::Io(e) => {
                error!(error = %e, "scratch I/O error");
                internal()
            }
        };
        (status, message).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_owned(),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unauthorized_is_401_invalid_key() {
        let resp = ServerError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn exhausted_fetch_is_bad_gateway() {
        let err = ServerError::from(FetchError::Exhausted {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "try later".into(),
            attempts: 3,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn remux_failure_is_generic_500() {
        let err = ServerError::from(RemuxError::Timeout(Duration::from_secs(60)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
