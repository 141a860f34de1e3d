//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::schemas::convert::Environment;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}='{value}' is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Runtime configuration for remux-server.
///
/// Built once in `main` and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,remux_fetch=trace"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Shared secret expected in `X-Auth-Key`. Empty disables the check.
    pub auth_key: String,

    /// Base URL that filenames resolve against for production requests.
    pub production_base: Option<Url>,

    /// Base URL for requests sent with `X-Environment: Development`.
    pub development_base: Option<Url>,

    /// Explicit ffmpeg binary. `None` uses the sidecar download or `PATH`.
    pub ffmpeg_path: Option<PathBuf>,

    /// Download an ffmpeg build into the sidecar directory at startup.
    pub ffmpeg_auto_download: bool,

    /// Wall-clock bound for one ffmpeg run.
    pub remux_timeout: Duration,

    /// Per-attempt timeout for source downloads.
    pub fetch_timeout: Duration,

    /// Total download attempts, first one included.
    pub fetch_attempts: usize,

    /// Pause between failed download attempts.
    pub fetch_retry_delay: Duration,

    /// Root under which every request gets its own scratch directory.
    pub scratch_dir: PathBuf,

    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            auth_key: String::new(),
            production_base: None,
            development_base: None,
            ffmpeg_path: None,
            ffmpeg_auto_download: false,
            remux_timeout: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(30),
            fetch_attempts: 3,
            fetch_retry_delay: Duration::ZERO,
            scratch_dir: std::env::temp_dir(),
            max_body_bytes: 512 * 1024 * 1024,
            enable_docs: true,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production_base = match var("PRODUCTION_BASE_PATH") {
            Some(v) => Some(parse_base("PRODUCTION_BASE_PATH", v)?),
            None => var("DOWNLOAD_BASE_PATH")
                .map(|v| parse_base("DOWNLOAD_BASE_PATH", v))
                .transpose()?,
        };
        let development_base = match var("DEVELOPMENT_BASE_PATH") {
            Some(v) => Some(parse_base("DEVELOPMENT_BASE_PATH", v)?),
            None => production_base.clone(),
        };

        Ok(Self {
            bind_address: var("REMUX_BIND").unwrap_or(defaults.bind_address),
            log_level: var("REMUX_LOG").unwrap_or(defaults.log_level),
            log_json: var("REMUX_LOG_JSON").map_or(defaults.log_json, |v| truthy(&v)),
            // Not trimmed-filtered: an explicitly empty key disables auth.
            auth_key: lookup("AUTH_KEY").unwrap_or_default(),
            production_base,
            development_base,
            ffmpeg_path: var("REMUX_FFMPEG_PATH").map(PathBuf::from),
            ffmpeg_auto_download: var("REMUX_FFMPEG_AUTO_DOWNLOAD")
                .map_or(defaults.ffmpeg_auto_download, |v| truthy(&v)),
            remux_timeout: parse(&var, "REMUX_TIMEOUT_SECS")
                .map_or(defaults.remux_timeout, Duration::from_secs),
            fetch_timeout: parse(&var, "REMUX_FETCH_TIMEOUT_SECS")
                .map_or(defaults.fetch_timeout, Duration::from_secs),
            fetch_attempts: parse(&var, "REMUX_FETCH_ATTEMPTS").unwrap_or(defaults.fetch_attempts),
            fetch_retry_delay: parse(&var, "REMUX_FETCH_RETRY_DELAY_MS")
                .map_or(defaults.fetch_retry_delay, Duration::from_millis),
            scratch_dir: var("REMUX_SCRATCH_DIR").map_or(defaults.scratch_dir, PathBuf::from),
            max_body_bytes: parse::<usize, _>(&var, "REMUX_MAX_BODY_MB")
                .map_or(defaults.max_body_bytes, |mb| mb.saturating_mul(1024 * 1024)),
            enable_docs: var("REMUX_ENABLE_DOCS").map_or(defaults.enable_docs, |v| truthy(&v)),
        })
    }

    /// Base URL selected by the request's environment.
    pub fn base_url(&self, environment: Environment) -> Option<&Url> {
        match environment {
            Environment::Production => self.production_base.as_ref(),
            Environment::Development => self.development_base.as_ref(),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_base(key: &'static str, value: String) -> Result<Url, ConfigError> {
    // A base without a trailing slash would drop its last path segment on join.
    let normalized = if value.ends_with('/') {
        value.clone()
    } else {
        format!("{value}/")
    };
    Url::parse(&normalized).map_err(|source| ConfigError::InvalidUrl { key, value, source })
}

fn parse<T, F>(var: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|v| v.trim().parse().ok())
}

fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
