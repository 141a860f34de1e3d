//! ffmpeg-backed audio remuxing.
//!
//! - [`Scratch`] owns the per-request directory that stages inputs and
//!   captures output; dropping it removes everything inside.
//! - [`Remuxer`] is the single seam the server talks to. [`FfmpegRemuxer`]
//!   is the production implementation: stream-copy audio, drop video,
//!   fast-start layout, hard wall-clock timeout.

pub mod error;
pub mod job;
pub mod remuxer;
pub mod scratch;

pub use error::RemuxError;
pub use job::{RemuxInput, RemuxJob};
pub use remuxer::{FfmpegRemuxer, Remuxer};
pub use scratch::Scratch;
