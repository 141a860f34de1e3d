use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

/// Where the primary audio comes from.
#[derive(Debug, Clone)]
pub enum RemuxInput {
    /// A staged file on disk.
    File(PathBuf),
    /// Raw container bytes, piped to ffmpeg's stdin.
    Stream(Bytes),
}

/// One ffmpeg invocation.
///
/// The output options are fixed and not part of the job: audio is always
/// stream-copied, video is always dropped and the container is written with
/// a fast-start layout.
#[derive(Debug, Clone)]
pub struct RemuxJob {
    pub primary: RemuxInput,
    /// `FFMETADATA` file whose chapters are copied into the output.
    pub chapters: Option<PathBuf>,
    pub output: PathBuf,
    pub timeout: Duration,
}

impl RemuxJob {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(primary: RemuxInput, output: impl Into<PathBuf>) -> Self {
        Self {
            primary,
            chapters: None,
            output: output.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_chapters(mut self, chapters: impl Into<PathBuf>) -> Self {
        self.chapters = Some(chapters.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
