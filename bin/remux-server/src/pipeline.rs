//! Conversion pipeline: acquire the source, stage it, remux, read back.
//!
//! Every variant follows the same skeleton and differs only in how the
//! source audio is obtained:
//!
//! | variant     | acquisition          | ffmpeg input            |
//! |-------------|----------------------|-------------------------|
//! | `Inline`    | request body         | stdin                   |
//! | `Remote`    | resolve + fetch      | stdin                   |
//! | `Chaptered` | resolve + fetch      | staged file + chapters  |
//!
//! All files live in one [`Scratch`] directory that is removed before
//! [`run`] returns, on success and on every error path.

use bytes::Bytes;
use remux_ffmpeg::{RemuxInput, RemuxJob, Scratch};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::schemas::convert::{ConversionBody, ConversionRequest, Environment};
use crate::state::AppState;

const SOURCE_FILE: &str = "source.mp4";
const CHAPTERS_FILE: &str = "chapters.txt";
const OUTPUT_FILE: &str = "output.mp4";

/// Source audio plus the optional chapter text to embed.
struct Acquired {
    audio: Bytes,
    chapters: Option<String>,
}

/// Run one negotiated request to completion and return the remuxed MP4.
pub async fn run(state: &AppState, request: ConversionRequest) -> Result<Bytes, ServerError> {
    let ConversionRequest { environment, body } = request;

    let acquired = match body {
        ConversionBody::Inline(audio) => Acquired {
            audio,
            chapters: None,
        },
        ConversionBody::Remote { filename } => Acquired {
            audio: fetch_source(state, environment, &filename).await?,
            chapters: None,
        },
        ConversionBody::Chaptered { filename, chapters } => Acquired {
            audio: fetch_source(state, environment, &filename).await?,
            chapters: Some(chapters),
        },
    };

    let scratch = Scratch::new_in(&state.config.scratch_dir).await?;
    let result = remux(state, &scratch, acquired).await;
    // Dropping `scratch` would also clean up; closing explicitly surfaces
    // removal failures in the log.
    if let Err(e) = scratch.close().await {
        warn!(error = %e, "failed to remove scratch directory");
    }
    result
}

async fn fetch_source(
    state: &AppState,
    environment: Environment,
    filename: &str,
) -> Result<Bytes, ServerError> {
    let base = state.config.base_url(environment).ok_or_else(|| {
        ServerError::NotConfigured(format!(
            "No base URL is configured for the {environment} environment"
        ))
    })?;

    let url = remux_fetch::resolve(base, filename);
    info!(%environment, %url, "resolved source");

    let outcome = state.fetcher.fetch(&url).await?;
    Ok(outcome.bytes)
}

async fn remux(state: &AppState, scratch: &Scratch, acquired: Acquired) -> Result<Bytes, ServerError> {
    let output = scratch.file(OUTPUT_FILE);

    let job = match acquired.chapters {
        None => RemuxJob::new(RemuxInput::Stream(acquired.audio), output),
        // ffmpeg takes only one piped input, so with a second (metadata)
        // input the audio has to be on disk.
        Some(chapters) => {
            let source = scratch.stage(SOURCE_FILE, &acquired.audio).await?;
            let metadata = scratch.stage(CHAPTERS_FILE, chapters.as_bytes()).await?;
            RemuxJob::new(RemuxInput::File(source), output).with_chapters(metadata)
        }
    }
    .with_timeout(state.config.remux_timeout);

    debug!(scratch = %scratch.path().display(), chapters = job.chapters.is_some(), "remux job ready");
    let bytes = state.remuxer.remux(job).await?;
    info!(size_bytes = bytes.len(), "remux finished");
    Ok(bytes)
}
