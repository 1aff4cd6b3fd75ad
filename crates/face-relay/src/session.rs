//! Shared-secret login and the set of issued session tokens.
//!
//! Membership in the active set is the only authorization check. Tokens have
//! no owner and no expiry; they live until the store is cleared at shutdown.

use rand::RngCore;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Password required")]
    MissingPassword,

    #[error("Invalid password")]
    InvalidPassword,
}

/// Generate an unguessable session token from the thread-local CSPRNG
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Short, log-safe prefix of a token
pub fn token_prefix(token: &str) -> &str {
    token.get(..6).unwrap_or(token)
}

#[derive(Debug, Default)]
pub struct SessionStore {
    tokens: RwLock<HashSet<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh token and mark it active.
    pub async fn issue(&self) -> String {
        let mut tokens = self.tokens.write().await;
        loop {
            let token = generate_session_token();
            if tokens.insert(token.clone()) {
                telemetry::metrics::RELAY_ACTIVE_SESSIONS.set(tokens.len() as i64);
                return token;
            }
        }
    }

    pub async fn is_active(&self, token: &str) -> bool {
        self.tokens.read().await.contains(token)
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    /// Drop every issued token.
    pub async fn clear(&self) {
        self.tokens.write().await.clear();
        telemetry::metrics::RELAY_ACTIVE_SESSIONS.set(0);
    }
}

/// Password check in front of the session store.
pub struct SessionGate {
    password: String,
    sessions: Arc<SessionStore>,
}

impl SessionGate {
    pub fn new(password: impl Into<String>, sessions: Arc<SessionStore>) -> Self {
        Self {
            password: password.into(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Exchange the shared password for a new session token.
    pub async fn login(&self, password: Option<&str>) -> Result<String, LoginError> {
        let password = match password {
            Some(p) if !p.is_empty() => p,
            _ => {
                telemetry::metrics::RELAY_LOGIN_ATTEMPTS
                    .with_label_values(&["missing"])
                    .inc();
                warn!("login attempt without password");
                return Err(LoginError::MissingPassword);
            }
        };

        if password != self.password {
            return Err(self.reject());
        }

        let token = self.sessions.issue().await;
        telemetry::metrics::RELAY_LOGIN_ATTEMPTS
            .with_label_values(&["granted"])
            .inc();
        let active_sessions = self.sessions.len().await;
        info!(
            session = %token_prefix(&token),
            active_sessions,
            "login successful"
        );
        Ok(token)
    }

    /// Refuse a login whose password can't match, counting it as a wrong password.
    pub fn reject(&self) -> LoginError {
        telemetry::metrics::RELAY_LOGIN_ATTEMPTS
            .with_label_values(&["rejected"])
            .inc();
        warn!("login rejected: invalid password");
        LoginError::InvalidPassword
    }

    /// Whether the caller-supplied token is currently active.
    pub async fn authorize(&self, token: Option<&str>) -> bool {
        match token {
            Some(token) if !token.is_empty() => self.sessions.is_active(token).await,
            _ => false,
        }
    }
}
