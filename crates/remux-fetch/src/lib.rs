//! Source acquisition for the remux relay.
//!
//! Two pieces live here:
//! - [`resolve`] pins a caller-supplied filename to a trusted base URL.
//! - [`Fetcher`] downloads the resolved URL with a small, fixed retry budget.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), remux_fetch::FetchError> {
//! use remux_fetch::{resolve, Fetcher};
//! use url::Url;
//!
//! let base = Url::parse("https://cdn.example.com/media/").unwrap();
//! let url = resolve(&base, "episodes/clip.mp4");
//! let outcome = Fetcher::builder().attempts(3).build()?.fetch(&url).await?;
//! println!("{} bytes after {} attempt(s)", outcome.bytes.len(), outcome.attempts);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fetcher;
pub mod resolve;

pub use error::FetchError;
pub use fetcher::{FetchOutcome, Fetcher, FetcherBuilder};
pub use resolve::resolve;
