use anyhow::{Context, Result};
use capture_client::{
    CaptureExit, CaptureLoop, ClientArgs, DirectoryCamera, HttpRelayClient, Renderer,
    TerminalRenderer,
};
use clap::Parser;
use std::sync::Arc;
use telemetry::LogConfig;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ClientArgs::parse();
    let _log_guard = telemetry::init_structured_logging(
        LogConfig::new("face-capture")
            .with_format(args.log_format())
            .with_version(env!("CARGO_PKG_VERSION")),
    );

    let client = Arc::new(HttpRelayClient::new(args.server.clone())?);
    match client.health().await {
        Ok(health) => info!(server = %args.server, status = %health.status, "relay reachable"),
        Err(e) => warn!(server = %args.server, error = %e, "relay health check failed"),
    }

    let interval = client.capture_interval().await;
    let camera = Arc::new(DirectoryCamera::new(&args.frames_dir));
    let renderer: Arc<dyn Renderer> = Arc::new(TerminalRenderer);
    renderer.render_placeholder();

    loop {
        let session = client
            .login(&args.password)
            .await
            .context("login to face-relay failed")?;

        let mut capture = CaptureLoop::new(
            camera.clone(),
            client.clone(),
            renderer.clone(),
            args.encoder(),
            interval,
            session,
        );
        capture
            .start()
            .with_context(|| format!("camera at {} unavailable", camera.dir().display()))?;

        let interrupted = tokio::select! {
            _ = capture.finished() => false,
            _ = interrupt() => true,
        };

        match capture.stop().await {
            CaptureExit::SessionExpired if !interrupted => {
                warn!("session expired, logging in again");
            }
            _ => break,
        }
    }

    info!("face-capture exiting");
    Ok(())
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("interrupt received, stopping capture");
}
