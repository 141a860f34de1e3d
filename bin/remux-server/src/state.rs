//! Shared application state injected into every Axum handler.

use std::fmt;
use std::sync::Arc;

use remux_fetch::{FetchError, Fetcher};
use remux_ffmpeg::{FfmpegRemuxer, Remuxer};

use crate::config::Config;

/// State shared across all HTTP handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Source downloader with the configured retry budget.
    pub fetcher: Arc<Fetcher>,
    /// Remux backend; ffmpeg in production.
    pub remuxer: Arc<dyn Remuxer>,
}

impl AppState {
    /// Wire the production fetcher and ffmpeg remuxer from `config`.
    pub fn from_config(config: Config) -> Result<Self, FetchError> {
        let remuxer = match &config.ffmpeg_path {
            Some(path) => FfmpegRemuxer::with_binary(path),
            None => FfmpegRemuxer::new(),
        };
        Self::with_remuxer(config, Arc::new(remuxer))
    }

    /// Same as [`AppState::from_config`] with a caller-supplied remuxer.
    pub fn with_remuxer(config: Config, remuxer: Arc<dyn Remuxer>) -> Result<Self, FetchError> {
        let fetcher = Fetcher::builder()
            .attempts(config.fetch_attempts)
            .retry_delay(config.fetch_retry_delay)
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            remuxer,
        })
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
