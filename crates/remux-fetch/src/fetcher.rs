use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;

/// Upstream body text is truncated to this many characters in log lines.
const LOG_BODY_LIMIT: usize = 512;

/// At most this many bytes of a non-success response body are read and kept.
pub const ERROR_BODY_LIMIT: usize = 4096;

/// A successful download.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: StatusCode,
    pub bytes: Bytes,
    /// 1-based number of the attempt that succeeded.
    pub attempts: usize,
}

/// Builder for [`Fetcher`].
///
/// Defaults: 3 attempts, no delay between attempts, 30 s per-attempt timeout.
#[derive(Debug, Clone)]
pub struct FetcherBuilder {
    attempts: usize,
    retry_delay: Duration,
    timeout: Duration,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::ZERO,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FetcherBuilder {
    /// Total attempts including the first one. Values below 1 are clamped to 1.
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Pause between a failed attempt and the next one.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Per-attempt timeout covering connect, headers and body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Fetcher, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("remux-fetch/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;

        Ok(Fetcher {
            client,
            attempts: self.attempts,
            retry_delay: self.retry_delay,
        })
    }
}

/// Downloads a single resource with a bounded retry budget.
///
/// Non-success statuses and transport errors both consume an attempt. Once
/// the budget is spent the last failure is returned; nothing is retried
/// forever.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    attempts: usize,
    retry_delay: Duration,
}

enum Failure {
    Status { status: StatusCode, body: String },
    Transport(reqwest::Error),
}

impl Fetcher {
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// GET `url`, retrying until a success status or the budget runs out.
    pub async fn fetch(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(%url, attempt, "fetching source");

            let failure = match self.fetch_once(url).await {
                Ok((status, bytes)) => {
                    info!(%url, attempt, %status, size_bytes = bytes.len(), "source fetched");
                    return Ok(FetchOutcome {
                        status,
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(failure) => failure,
            };

            match &failure {
                Failure::Status { status, body } => warn!(
                    %url,
                    attempt,
                    %status,
                    body = %truncate(body, LOG_BODY_LIMIT),
                    "upstream returned non-success status"
                ),
                Failure::Transport(e) => warn!(%url, attempt, error = %e, "upstream request failed"),
            }

            if attempt >= self.attempts {
                return Err(match failure {
                    Failure::Status { status, body } => FetchError::Exhausted {
                        status,
                        body,
                        attempts: attempt,
                    },
                    Failure::Transport(source) => FetchError::Transport {
                        source,
                        attempts: attempt,
                    },
                });
            }

            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<(StatusCode, Bytes), Failure> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(Failure::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = read_capped(resp, ERROR_BODY_LIMIT).await;
            return Err(Failure::Status { status, body });
        }

        let bytes = resp.bytes().await.map_err(Failure::Transport)?;
        Ok((status, bytes))
    }
}

/// Read up to `limit` bytes of `resp` as lossy UTF-8; the rest is never pulled.
async fn read_capped(mut resp: reqwest::Response, limit: usize) -> String {
    let mut buf = Vec::new();
    while buf.len() < limit {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
