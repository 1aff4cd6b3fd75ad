use anyhow::{Context, Result};
use face_relay::{
    api, FaceBackend, FaceService, MockFaceService, RekognitionFaceService, RelayConfig,
    RelayState, SessionStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = telemetry::init_with_service("face-relay");

    let config = RelayConfig::from_env()?;
    info!(
        version = common::VERSION,
        region = %config.face_service.region,
        collection = %config.face_service.collection_id,
        threshold = config.face_service.face_match_threshold,
        capture_interval_secs = config.capture_interval_seconds,
        backend = ?config.backend,
        "face-relay configuration loaded"
    );

    let service: Arc<dyn FaceService> = match config.backend {
        FaceBackend::Rekognition => {
            Arc::new(RekognitionFaceService::from_config(&config.face_service).await)
        }
        FaceBackend::Mock => {
            warn!("using mock face service; results are canned");
            Arc::new(MockFaceService::new())
        }
    };
    info!(provider = service.name(), "face service client initialized");

    let sessions = Arc::new(SessionStore::new());
    let state = RelayState::from_config(&config, service, sessions);
    let app = api::app(state.clone(), config.static_dir.as_deref());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "face-relay listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
