#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode, Uri};
use axum::response::Response;
use http_body_util::BodyExt;
use remux_ffmpeg::{RemuxError, RemuxInput, RemuxJob, Remuxer};
use remux_server::config::Config;
use remux_server::routes;
use remux_server::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

pub const AUDIO_MP4: &str = "audio/mp4";
pub const REMUXED: &[u8] = b"remuxed-output";

// ── fake remuxer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Succeed,
    Fail,
    Timeout,
}

/// What the remuxer saw when it was called.
#[derive(Debug, Clone)]
pub struct Call {
    pub job: RemuxJob,
    /// Primary input was a file that existed at call time.
    pub primary_staged: bool,
    pub primary_bytes: Option<Bytes>,
    pub chapters_text: Option<String>,
}

#[derive(Debug)]
pub struct FakeRemuxer {
    behaviour: Behaviour,
    calls: Mutex<Vec<Call>>,
}

impl FakeRemuxer {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, job: RemuxJob) -> Result<Bytes, RemuxError> {
        let (primary_staged, primary_bytes) = match &job.primary {
            RemuxInput::File(path) => (path.exists(), std::fs::read(path).ok().map(Bytes::from)),
            RemuxInput::Stream(bytes) => (false, Some(bytes.clone())),
        };
        let chapters_text = job
            .chapters
            .as_ref()
            .and_then(|p| std::fs::read_to_string(p).ok());
        self.calls.lock().unwrap().push(Call {
            job: job.clone(),
            primary_staged,
            primary_bytes,
            chapters_text,
        });

        match self.behaviour {
            Behaviour::Succeed => {
                tokio::fs::write(&job.output, REMUXED).await?;
                Ok(Bytes::from_static(REMUXED))
            }
            Behaviour::Fail => Err(RemuxError::Spawn(std::io::Error::other("fake ffmpeg failed"))),
            Behaviour::Timeout => Err(RemuxError::Timeout(job.timeout)),
        }
    }
}

// ── mock origin ──────────────────────────────────────────────────────────────

/// An in-process HTTP origin that answers every path the same way.
pub struct Origin {
    /// Base URL with a `/media/` path, as an operator would configure it.
    pub base: Url,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl Origin {
    pub async fn serving(body: &'static [u8]) -> Self {
        Self::start(StatusCode::OK, Bytes::from_static(body)).await
    }

    pub async fn failing(status: StatusCode, text: &'static str) -> Self {
        Self::start(status, Bytes::from_static(text.as_bytes())).await
    }

    async fn start(status: StatusCode, body: Bytes) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let paths = Arc::new(Mutex::new(Vec::new()));

        let app = {
            let hits = Arc::clone(&hits);
            let paths = Arc::clone(&paths);
            Router::new().fallback(move |uri: Uri| {
                let hits = Arc::clone(&hits);
                let paths = Arc::clone(&paths);
                let body = body.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    paths.lock().unwrap().push(uri.path().to_owned());
                    (status, body)
                }
            })
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: Url::parse(&format!("http://{addr}/media/")).unwrap(),
            hits,
            paths,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

// ── application under test ───────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub remuxer: Arc<FakeRemuxer>,
    pub scratch_root: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Entries left under the scratch root; a root that was never created counts as empty.
    pub fn scratch_entries(&self) -> usize {
        scratch_entries(&self.scratch_root)
    }
}

pub fn scratch_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map_or(0, |entries| entries.count())
}

/// Configuration with the fetch budget tightened for tests.
pub fn config(base: Option<&Url>) -> Config {
    Config {
        production_base: base.cloned(),
        development_base: base.cloned(),
        fetch_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn app(mut config: Config, behaviour: Behaviour) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let scratch_root = dir.path().join("scratch");
    config.scratch_dir = scratch_root.clone();

    let remuxer = Arc::new(FakeRemuxer::new(behaviour));
    let state = AppState::with_remuxer(config, Arc::clone(&remuxer) as Arc<dyn Remuxer>).unwrap();

    TestApp {
        router: routes::build(Arc::new(state)),
        remuxer,
        scratch_root,
        _dir: dir,
    }
}

// ── request helpers ──────────────────────────────────────────────────────────

pub fn post(headers: &[(&str, &str)], body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body.into()).unwrap()
}

pub async fn body_bytes(resp: Response) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_text(resp: Response) -> String {
    String::from_utf8(body_bytes(resp).await.to_vec()).unwrap()
}
