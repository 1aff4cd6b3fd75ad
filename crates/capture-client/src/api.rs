use async_trait::async_trait;
use common::{
    analysis::AnalysisResult,
    api::{
        paths, ConfigResponse, ErrorResponse, HealthResponse, LoginRequest, LoginResponse,
        AnalyzeRequest, DEFAULT_CAPTURE_INTERVAL_MS, SESSION_HEADER,
    },
};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use telemetry::correlation::generate_correlation_id;
use tracing::{debug, info, instrument, warn};

use crate::error::ClientError;

/// The call the capture loop makes once per frame.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Submit a base64 frame under `session`.
    async fn analyze(&self, session: &str, image: &str) -> Result<AnalysisResult, ClientError>;
}

pub struct HttpRelayClient {
    base: Url,
    client: reqwest::Client,
}

impl HttpRelayClient {
    pub fn new(base: Url) -> Result<Self, ClientError> {
        let client = telemetry::create_traced_client(None)?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Endpoint(format!("{}{}: {}", self.base, path, e)))
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(paths::HEALTH)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn config(&self) -> Result<ConfigResponse, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(paths::CONFIG)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Capture period advertised by the relay, or 1500 ms if it can't be fetched.
    pub async fn capture_interval(&self) -> Duration {
        let fallback = Duration::from_millis(DEFAULT_CAPTURE_INTERVAL_MS);
        match self.config().await {
            Ok(config) => match config.capture_interval() {
                Some(interval) => {
                    info!(interval_ms = interval.as_millis() as u64, "capture interval loaded");
                    interval
                }
                None => {
                    warn!(
                        advertised = config.capture_interval_seconds,
                        "relay advertised an unusable interval, using default"
                    );
                    fallback
                }
            },
            Err(e) => {
                warn!(error = %e, interval_ms = DEFAULT_CAPTURE_INTERVAL_MS, "failed to load config, using default interval");
                fallback
            }
        }
    }

    /// Log in with the shared password and return the session token.
    pub async fn login(&self, password: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(self.endpoint(paths::LOGIN)?)
            .json(&LoginRequest::new(password))
            .send()
            .await?;
        let status = resp.status();

        // rejections still carry the {success, message} envelope
        let body: LoginResponse = resp.json().await?;
        match body {
            LoginResponse {
                success: true,
                session_id: Some(session_id),
                ..
            } => {
                info!("login successful");
                Ok(session_id)
            }
            LoginResponse { message, .. } => {
                let message = message.unwrap_or_else(|| format!("status {}", status));
                warn!(%status, %message, "login failed");
                Err(ClientError::LoginRejected(message))
            }
        }
    }
}

#[async_trait]
impl RelayApi for HttpRelayClient {
    #[instrument(skip_all, fields(base64_len = image.len()))]
    async fn analyze(&self, session: &str, image: &str) -> Result<AnalysisResult, ClientError> {
        let correlation_id = generate_correlation_id();
        let request = self
            .client
            .post(self.endpoint(paths::ANALYZE_FACE)?)
            .header(SESSION_HEADER, session)
            .json(&AnalyzeRequest {
                image: Some(image.to_string()),
            });

        let started = std::time::Instant::now();
        let resp = telemetry::add_correlation_id_header(request, &correlation_id)
            .send()
            .await?;
        let status = resp.status();
        debug!(%status, elapsed_ms = started.elapsed().as_millis() as u64, %correlation_id, "analyze response received");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = match resp.json::<ErrorResponse>().await {
                Ok(ErrorResponse {
                    error,
                    details: Some(details),
                }) => format!("{}: {}", error, details),
                Ok(ErrorResponse { error, .. }) => error,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}
