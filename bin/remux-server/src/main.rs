//! remux-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON or pretty).
//! 3. Optionally download an ffmpeg build into the sidecar directory.
//! 4. Build the shared state (fetcher, ffmpeg remuxer).
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use remux_server::config::Config;
use remux_server::routes;
use remux_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env()?;

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: REMUX_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "remux-server starting");
    if cfg.auth_key.is_empty() {
        warn!("AUTH_KEY is empty; requests are not authenticated");
    }
    match (&cfg.production_base, &cfg.development_base) {
        (None, None) => warn!("no base URL configured; only inline MP4 requests can be served"),
        (prod, dev) => info!(
            production = ?prod.as_ref().map(|u| u.as_str()),
            development = ?dev.as_ref().map(|u| u.as_str()),
            "source base URLs"
        ),
    }

    // ── 3. ffmpeg ──────────────────────────────────────────────────────────────
    if cfg.ffmpeg_auto_download && cfg.ffmpeg_path.is_none() {
        info!("ensuring ffmpeg is available (auto-download enabled)");
        tokio::task::spawn_blocking(ffmpeg_sidecar::download::auto_download).await??;
    }

    // ── 4. Shared application state ────────────────────────────────────────────
    let bind_address = cfg.bind_address.clone();
    let state = Arc::new(AppState::from_config(cfg)?);
    info!(
        timeout_secs = state.config.remux_timeout.as_secs(),
        fetch_attempts = state.fetcher.attempts(),
        scratch_dir = %state.config.scratch_dir.display(),
        "remux pipeline ready"
    );

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("remux-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
