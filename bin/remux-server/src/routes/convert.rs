//! `POST /` – the conversion endpoint.
//!
//! The request shape is picked by `Content-Type`:
//! - `audio/mp4`: the body is the MP4 to remux.
//! - `text/plain`: the body is a filename to fetch.
//! - `application/json`: `{"filename": ..., "chapters": ...}`.
//!
//! Checks run in a fixed order and stop at the first failure: auth key
//! (middleware, 401), content type (400), accept (400), body (400).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Router, middleware};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::auth;
use crate::pipeline;
use crate::schemas::convert::{ConversionBody, ConversionRequest, Environment, SourceRequest};
use crate::state::AppState;

pub const AUDIO_MP4: &str = "audio/mp4";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";
pub static X_ENVIRONMENT: &str = "x-environment";

#[derive(OpenApi)]
#[openapi(paths(convert), components(schemas(SourceRequest)))]
pub struct ConvertApi;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let max_body_bytes = state.config.max_body_bytes;
    Router::new()
        .route("/", post(convert))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth_key))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

/// Remux MP4 audio: stream-copy the audio, drop video, fast-start layout.
#[utoipa::path(
    post,
    path = "/",
    tag = "remux",
    params(
        ("X-Auth-Key" = Option<String>, Header, description = "Shared secret; required unless the server runs without one"),
        ("X-Environment" = Option<String>, Header, description = "`Development` resolves filenames against the development base URL"),
    ),
    request_body(
        content = SourceRequest,
        content_type = "application/json",
        description = "Filename (and chapters) to fetch. Raw `audio/mp4` bodies and `text/plain` filenames are accepted too."
    ),
    responses(
        (status = 200, description = "Remuxed MP4 audio", content_type = "audio/mp4", body = Vec<u8>),
        (status = 400, description = "Unsupported Content-Type or Accept, or malformed body"),
        (status = 401, description = "Invalid key"),
        (status = 502, description = "Source could not be fetched from the origin"),
        (status = 503, description = "No base URL configured for the selected environment"),
        (status = 500, description = "ffmpeg failed or timed out"),
    )
)]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServerError> {
    let request = negotiate(&headers, body)?;
    debug!(environment = %request.environment, variant = variant_name(&request.body), "request accepted");

    let output = pipeline::run(&state, request).await?;
    info!(size_bytes = output.len(), "conversion succeeded");

    Ok(([(header::CONTENT_TYPE, AUDIO_MP4)], output).into_response())
}

/// Validate representation headers and extract the request body.
pub fn negotiate(headers: &HeaderMap, body: Bytes) -> Result<ConversionRequest, ServerError> {
    let content_type = header_str(headers, header::CONTENT_TYPE.as_str()).map(essence);
    let content_type = match content_type.as_deref() {
        Some(ct @ (AUDIO_MP4 | APPLICATION_JSON | TEXT_PLAIN)) => ct.to_owned(),
        _ => {
            return Err(ServerError::BadRequest(
                "Only conversions from MP4 audio are supported".into(),
            ));
        }
    };

    if !accepts_mp4(header_str(headers, header::ACCEPT.as_str())) {
        return Err(ServerError::BadRequest(
            "Only conversions to MP4 audio are supported".into(),
        ));
    }

    let environment = Environment::from_header(header_str(headers, X_ENVIRONMENT));

    let body = match content_type.as_str() {
        AUDIO_MP4 => {
            if body.is_empty() {
                return Err(ServerError::BadRequest("Request body is empty".into()));
            }
            ConversionBody::Inline(body)
        }
        TEXT_PLAIN => {
            let filename = std::str::from_utf8(&body)
                .map_err(|_| ServerError::BadRequest("Filename must be UTF-8 text".into()))?
                .trim();
            ConversionBody::Remote {
                filename: require_filename(filename)?.to_owned(),
            }
        }
        _ => {
            let mut req: SourceRequest = serde_json::from_slice(&body)
                .map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {e}")))?;
            req.filename = require_filename(req.filename.trim())?.to_owned();
            ConversionBody::from(req)
        }
    };

    Ok(ConversionRequest { environment, body })
}

fn require_filename(filename: &str) -> Result<&str, ServerError> {
    if filename.is_empty() {
        return Err(ServerError::BadRequest("filename must not be empty".into()));
    }
    Ok(filename)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Media type without parameters, lower-cased: `Audio/MP4; x=y` → `audio/mp4`.
fn essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `true` when one of the `Accept` entries is exactly `audio/mp4`.
fn accepts_mp4(accept: Option<&str>) -> bool {
    accept.is_some_and(|value| value.split(',').any(|entry| essence(entry) == AUDIO_MP4))
}

fn variant_name(body: &ConversionBody) -> &'static str {
    match body {
        ConversionBody::Inline(_) => "inline",
        ConversionBody::Remote { .. } => "remote",
        ConversionBody::Chaptered { .. } => "chaptered",
    }
}
