use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use ffmpeg_sidecar::command::FfmpegCommand;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::RemuxError;
use crate::job::{RemuxInput, RemuxJob};

/// Lines of ffmpeg's stderr kept when reporting a failed run.
const STDERR_TAIL_LINES: usize = 20;

/// Runs one remux job to completion.
///
/// Implementations never retry: a failure is final for the job.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Run `job` and return the bytes of the finished output container.
    async fn remux(&self, job: RemuxJob) -> Result<Bytes, RemuxError>;
}

/// [`Remuxer`] that shells out to an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    binary: PathBuf,
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRemuxer {
    /// Use the sidecar-downloaded ffmpeg if present, otherwise `ffmpeg` on `PATH`.
    pub fn new() -> Self {
        Self {
            binary: ffmpeg_sidecar::paths::ffmpeg_path(),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build the ffmpeg command line for `job`.
    ///
    /// `-y -i <primary> [-i <chapters> -map_metadata 1 -map_chapters 1]
    ///  -vn -c:a copy -movflags +faststart <output>`
    fn command(&self, job: &RemuxJob) -> Result<Command, RemuxError> {
        let primary = match &job.primary {
            RemuxInput::File(path) => utf8(path)?,
            RemuxInput::Stream(_) => "pipe:0",
        };

        let mut ffmpeg = FfmpegCommand::new_with_path(&self.binary);
        ffmpeg.hide_banner().overwrite().input(primary);
        if let Some(chapters) = &job.chapters {
            ffmpeg
                .input(utf8(chapters)?)
                .args(["-map_metadata", "1", "-map_chapters", "1"]);
        }
        ffmpeg
            .args(["-vn", "-c:a", "copy", "-movflags", "+faststart"])
            .output(utf8(&job.output)?);

        // ffmpeg-sidecar owns argument assembly; the process itself runs on
        // tokio so the request task can be suspended and time-bounded.
        let inner = ffmpeg.as_inner_mut();
        let mut command = Command::new(inner.get_program());
        command
            .args(inner.get_args())
            .stdin(match job.primary {
                RemuxInput::Stream(_) => Stdio::piped(),
                RemuxInput::File(_) => Stdio::null(),
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, job: RemuxJob) -> Result<Bytes, RemuxError> {
        let mut command = self.command(&job)?;
        debug!(command = ?command.as_std(), "ffmpeg command prepared");

        let started = Instant::now();
        let mut child = command.spawn().map_err(RemuxError::Spawn)?;
        info!(pid = ?child.id(), output = %job.output.display(), "ffmpeg running");

        let stdin = child.stdin.take();
        let payload = match &job.primary {
            RemuxInput::Stream(bytes) => Some(bytes.clone()),
            RemuxInput::File(_) => None,
        };
        let feed = async move {
            if let (Some(mut pipe), Some(bytes)) = (stdin, payload) {
                // ffmpeg may stop reading early on bad input; its exit status
                // is the error that matters.
                if let Err(e) = pipe.write_all(&bytes).await {
                    debug!(error = %e, "ffmpeg closed stdin early");
                }
            }
        };
        let run = async {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        // Dropping `run` on timeout drops the child, and kill_on_drop kills it.
        let output = match tokio::time::timeout(job.timeout, run).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(timeout = ?job.timeout, "ffmpeg timed out; process killed");
                return Err(RemuxError::Timeout(job.timeout));
            }
        };

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr, STDERR_TAIL_LINES);
            warn!(status = %output.status, stderr = %stderr, "ffmpeg failed");
            return Err(RemuxError::Failed {
                status: output.status,
                stderr,
            });
        }

        let bytes = tokio::fs::read(&job.output).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis(),
            size_bytes = bytes.len(),
            "ffmpeg finished"
        );
        Ok(Bytes::from(bytes))
    }
}

fn utf8(path: &Path) -> Result<&str, RemuxError> {
    path.to_str()
        .ok_or_else(|| RemuxError::InvalidPath(path.to_path_buf()))
}

fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn contains_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_stream_job_reads_stdin() {
        let job = RemuxJob::new(RemuxInput::Stream(Bytes::from_static(b"x")), "/tmp/out.mp4");
        let command = FfmpegRemuxer::with_binary("ffmpeg").command(&job).unwrap();
        let args = args(&command);

        assert!(args.contains(&"-y".to_owned()));
        assert!(contains_pair(&args, "-i", "pipe:0"));
        assert!(args.contains(&"-vn".to_owned()));
        assert!(contains_pair(&args, "-c:a", "copy"));
        assert!(contains_pair(&args, "-movflags", "+faststart"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
        assert!(!args.contains(&"-map_chapters".to_owned()));
    }

    #[test]
    fn test_chapter_job_adds_metadata_input() {
        let job = RemuxJob::new(RemuxInput::File("/tmp/in.mp4".into()), "/tmp/out.mp4")
            .with_chapters("/tmp/chapters.txt");
        let command = FfmpegRemuxer::with_binary("ffmpeg").command(&job).unwrap();
        let args = args(&command);

        assert!(contains_pair(&args, "-i", "/tmp/in.mp4"));
        assert!(contains_pair(&args, "-i", "/tmp/chapters.txt"));
        assert!(contains_pair(&args, "-map_chapters", "1"));
        assert!(contains_pair(&args, "-map_metadata", "1"));
        let primary = args.iter().position(|a| a == "/tmp/in.mp4").unwrap();
        let chapters = args.iter().position(|a| a == "/tmp/chapters.txt").unwrap();
        assert!(primary < chapters);
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let tail = stderr_tail(b"a\nb\nc\nd", 2);
        assert_eq!(tail, "c\nd");
        assert_eq!(stderr_tail(b"", 5), "");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = RemuxJob::new(RemuxInput::Stream(Bytes::new()), dir.path().join("out.mp4"));
        let err = FfmpegRemuxer::with_binary(dir.path().join("no-such-ffmpeg"))
            .remux(job)
            .await
            .unwrap_err();
        assert!(matches!(err, RemuxError::Spawn(_)));
    }

    /// Write an executable shell script that stands in for ffmpeg.
    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    #[traced_test]
    async fn test_nonzero_exit_is_failure_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_ffmpeg(dir.path(), "cat >/dev/null\necho 'Invalid data found' >&2\nexit 1");
        let job = RemuxJob::new(
            RemuxInput::Stream(Bytes::from_static(b"not an mp4")),
            dir.path().join("out.mp4"),
        );
        let err = FfmpegRemuxer::with_binary(binary).remux(job).await.unwrap_err();
        match err {
            RemuxError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(1));
                assert!(stderr.contains("Invalid data found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(logs_contain("ffmpeg failed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_tool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_ffmpeg(dir.path(), "sleep 30");
        let job = RemuxJob::new(RemuxInput::File(dir.path().join("in.mp4")), dir.path().join("out.mp4"))
            .with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let err = FfmpegRemuxer::with_binary(binary).remux(job).await.unwrap_err();
        assert!(matches!(err, RemuxError::Timeout(t) if t == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_reads_output_file() {
        let dir = tempfile::tempdir().unwrap();
        // The output path is the last argument.
        let binary = fake_ffmpeg(dir.path(), "for last; do :; done\nprintf remuxed > \"$last\"");
        let job = RemuxJob::new(RemuxInput::File(dir.path().join("in.mp4")), dir.path().join("out.mp4"));
        let bytes = FfmpegRemuxer::with_binary(binary).remux(job).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"remuxed"));
    }
}
