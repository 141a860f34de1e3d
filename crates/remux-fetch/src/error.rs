use thiserror::Error;

/// Errors that can be returned by remux-fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt got a response, and the last one was not a success.
    #[error("upstream responded {status} after {attempts} attempt(s): {body}")]
    Exhausted {
        status: reqwest::StatusCode,
        body: String,
        attempts: usize,
    },

    /// The last attempt failed before a response arrived (connect, timeout, body read).
    #[error("HTTP request failed after {attempts} attempt(s): {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
        attempts: usize,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> usize {
        match self {
            FetchError::Exhausted { attempts, .. } | FetchError::Transport { attempts, .. } => {
                *attempts
            }
            FetchError::Client(_) => 0,
        }
    }
}
