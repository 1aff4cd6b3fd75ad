//! HTTP contracts between the capture client and the face relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Header carrying the session token on protected routes.
pub const SESSION_HEADER: &str = "x-session-id";

/// Capture interval the relay advertises when none is configured.
pub const DEFAULT_CAPTURE_INTERVAL_SECONDS: f64 = 1.5;

/// Capture interval the client falls back to when the config fetch fails.
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 1500;

/// Minimum similarity (percent) for an identity match.
pub const DEFAULT_FACE_MATCH_THRESHOLD: f32 = 80.0;

/// Upper bound on a request body; one encoded frame fits comfortably.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub mod paths {
    pub const HEALTH: &str = "/api/health";
    pub const CONFIG: &str = "/api/config";
    pub const LOGIN: &str = "/api/login";
    pub const ANALYZE_FACE: &str = "/api/analyze-face";
    pub const METRICS: &str = "/metrics";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            message: "Server is running".to_string(),
        }
    }
}

/// Client-facing configuration served by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub capture_interval_seconds: f64,
}

impl ConfigResponse {
    /// Capture period as a `Duration`, or `None` if the advertised value is unusable.
    pub fn capture_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.capture_interval_seconds)
            .ok()
            .filter(|interval| !interval.is_zero())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Normally a string; other JSON values are accepted and never match
    #[serde(default)]
    pub password: Option<Value>,
}

/// How a login body's password field reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmittedPassword<'a> {
    /// Absent, or a falsy value (`null`, `false`, `0`, `""`)
    Absent,
    Text(&'a str),
    /// Present but not a string, so it can't be the password
    Other,
}

impl LoginRequest {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Some(Value::String(password.into())),
        }
    }

    pub fn submitted_password(&self) -> SubmittedPassword<'_> {
        match &self.password {
            None | Some(Value::Null) | Some(Value::Bool(false)) => SubmittedPassword::Absent,
            Some(Value::String(s)) if s.is_empty() => SubmittedPassword::Absent,
            Some(Value::String(s)) => SubmittedPassword::Text(s.as_str()),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => SubmittedPassword::Absent,
            Some(_) => SubmittedPassword::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl LoginResponse {
    pub fn granted(session_id: String) -> Self {
        Self {
            success: true,
            message: Some("Login successful".to_string()),
            session_id: Some(session_id),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            session_id: None,
        }
    }
}

/// One frame submitted for analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded JPEG/PNG bytes
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
