use anyhow::{bail, Context, Result};
use common::api::{
    DEFAULT_CAPTURE_INTERVAL_SECONDS, DEFAULT_FACE_MATCH_THRESHOLD, DEFAULT_MAX_BODY_BYTES,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which implementation answers detect/search calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceBackend {
    Rekognition,
    /// Scripted in-process service, for demos without cloud credentials
    Mock,
}

impl std::str::FromStr for FaceBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rekognition" | "aws" => Ok(Self::Rekognition),
            "mock" => Ok(Self::Mock),
            other => bail!("unknown face service backend '{}'", other),
        }
    }
}

/// Connection settings for the remote face service.
#[derive(Debug, Clone)]
pub struct FaceServiceConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Override for the service endpoint (local emulators)
    pub endpoint_url: Option<String>,
    pub collection_id: String,
    /// Minimum similarity in percent; fixed for the life of the process
    pub face_match_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Shared secret checked by `/api/login`
    pub password: String,
    pub capture_interval_seconds: f64,
    pub max_body_bytes: usize,
    pub backend: FaceBackend,
    pub face_service: FaceServiceConfig,
    pub static_dir: Option<PathBuf>,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("FACE_RELAY_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("invalid FACE_RELAY_ADDR")?;

        let password = lookup("AUTH_PASSWORD")
            .filter(|p| !p.is_empty())
            .context("AUTH_PASSWORD environment variable required")?;

        let capture_interval_seconds = match lookup("CAPTURE_INTERVAL_SECONDS") {
            Some(raw) => raw
                .parse::<f64>()
                .context("invalid CAPTURE_INTERVAL_SECONDS")?,
            None => DEFAULT_CAPTURE_INTERVAL_SECONDS,
        };
        // clients turn this into a timer period, so it has to fit a Duration
        if Duration::try_from_secs_f64(capture_interval_seconds).map_or(true, |d| d.is_zero()) {
            bail!("CAPTURE_INTERVAL_SECONDS must be a positive number of seconds");
        }

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(raw) => raw.parse().context("invalid MAX_BODY_BYTES")?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let backend = match lookup("FACE_SERVICE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => FaceBackend::Rekognition,
        };

        let face_match_threshold = match lookup("FACE_MATCH_THRESHOLD") {
            Some(raw) => raw.parse::<f32>().context("invalid FACE_MATCH_THRESHOLD")?,
            None => DEFAULT_FACE_MATCH_THRESHOLD,
        };
        if !(0.0..=100.0).contains(&face_match_threshold) {
            bail!("FACE_MATCH_THRESHOLD must be between 0 and 100");
        }

        let collection_id = match (lookup("REKOGNITION_COLLECTION_ID"), backend) {
            (Some(id), _) if !id.is_empty() => id,
            (_, FaceBackend::Mock) => "mock-collection".to_string(),
            (_, FaceBackend::Rekognition) => {
                bail!("REKOGNITION_COLLECTION_ID environment variable required")
            }
        };

        let face_service = FaceServiceConfig {
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id: lookup("AWS_ACCESS_KEY_ID"),
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY"),
            endpoint_url: lookup("AWS_ENDPOINT_URL"),
            collection_id,
            face_match_threshold,
        };

        Ok(Self {
            bind_addr,
            password,
            capture_interval_seconds,
            max_body_bytes,
            backend,
            face_service,
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
        })
    }
}
