//! remux-server – MP4 audio remux relay.
//!
//! A single `POST /` endpoint accepts MP4 audio inline or by filename,
//! stream-copies the audio into a fresh fast-start MP4 with ffmpeg
//! (optionally adding chapters) and returns the result.

pub mod config;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod schemas;
pub mod state;
