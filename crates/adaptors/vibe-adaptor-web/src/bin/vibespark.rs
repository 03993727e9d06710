//! Vibespark backend server
//!
//! Usage:
//! ```bash
//! vibespark --port 3000
//! ```

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use vibe_adaptor_web::{build_router, AppState};
use vibe_core::{init_logging, load_env, Settings};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vibespark")]
#[command(about = "Voice-call backend: AI chat pipeline, session tokens and signaling relay")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Directory for temporary audio uploads
    #[arg(long, env = "UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env()?;
    init_logging();

    let args = Args::parse();

    let mut settings = Settings::from_env();
    settings.host = args.host;
    settings.port = args.port;
    if let Some(dir) = args.upload_dir {
        settings.upload_dir = dir;
    }

    if let Err(e) = settings.pipeline_credentials() {
        warn!("{}", e);
    }
    if settings.anam_api_key.is_none() {
        warn!("ANAM_API_KEY is not set; /api/anam/session will fail");
    }
    if !settings.livekit_configured() {
        warn!("LiveKit credentials are not set; /api/livekit/token will fail");
    }

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid address {}:{}", settings.host, settings.port))?;

    let state = Arc::new(AppState::from_settings(settings)?);
    let app = build_router(state.clone());

    info!(
        addr = %addr,
        upload_dir = %state.settings.upload_dir.display(),
        timeout_secs = state.settings.provider_timeout.as_secs(),
        "Vibespark backend starting"
    );
    info!("Endpoints: GET / | GET /health | POST /api/ai/chat | POST /api/anam/session | POST /api/livekit/token | GET /ws");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
