use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemuxError {
    /// The ffmpeg binary could not be started (missing, not executable).
    #[error("failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    /// ffmpeg ran past the job's wall-clock bound and was killed.
    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),

    /// ffmpeg exited unsuccessfully. `stderr` holds the tail of its log.
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    /// A path handed to ffmpeg is not valid UTF-8.
    #[error("path is not valid UTF-8: {0:?}")]
    InvalidPath(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
