//! Per-request scratch directory.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// A private directory holding every temporary file of one request.
///
/// The directory and its contents are removed when the value is dropped,
/// whichever way the owning scope exits. [`Scratch::close`] does the same
/// but reports removal errors.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh, uniquely named directory under `root`, creating the
    /// root if needed. Runs on the blocking pool.
    pub async fn new_in(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let dir = blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new().prefix("remux-").tempdir_in(&root)
        })
        .await?;
        debug!(path = %dir.path().display(), "scratch directory created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the scratch directory. Nothing is created.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` to `name` and return its path.
    pub async fn stage(&self, name: &str, bytes: impl AsRef<[u8]>) -> io::Result<PathBuf> {
        let path = self.file(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Remove the directory now, on the blocking pool.
    pub async fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        blocking(move || self.dir.close()).await?;
        debug!(path = %path.display(), "scratch directory removed");
        Ok(())
    }
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}
