use common::api::ConfigResponse;
use std::sync::Arc;
use tracing::info;

use crate::{
    analyzer::Analyzer,
    config::RelayConfig,
    face_service::FaceService,
    session::{SessionGate, SessionStore},
};

#[derive(Clone)]
pub struct RelayState {
    inner: Arc<RelayStateInner>,
}

struct RelayStateInner {
    gate: SessionGate,
    analyzer: Analyzer,
    client_config: ConfigResponse,
    max_body_bytes: usize,
}

impl RelayState {
    pub fn new(
        gate: SessionGate,
        analyzer: Analyzer,
        capture_interval_seconds: f64,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RelayStateInner {
                gate,
                analyzer,
                client_config: ConfigResponse {
                    capture_interval_seconds,
                },
                max_body_bytes,
            }),
        }
    }

    pub fn from_config(
        config: &RelayConfig,
        service: Arc<dyn FaceService>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        let gate = SessionGate::new(config.password.clone(), sessions);
        let analyzer = Analyzer::new(
            service,
            config.face_service.collection_id.clone(),
            config.face_service.face_match_threshold,
        );
        Self::new(
            gate,
            analyzer,
            config.capture_interval_seconds,
            config.max_body_bytes,
        )
    }

    pub fn gate(&self) -> &SessionGate {
        &self.inner.gate
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.inner.analyzer
    }

    pub fn client_config(&self) -> &ConfigResponse {
        &self.inner.client_config
    }

    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    /// Invalidate every session; called once the server stops accepting requests.
    pub async fn shutdown(&self) {
        let sessions = self.inner.gate.sessions();
        let revoked = sessions.len().await;
        sessions.clear().await;
        info!(revoked, "session store cleared");
    }
}
