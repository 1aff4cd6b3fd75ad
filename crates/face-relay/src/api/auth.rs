use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common::api::SESSION_HEADER;
use tracing::warn;

use crate::{error::ApiError, state::RelayState};

/// Reject requests whose `X-Session-ID` is missing or not an active session.
///
/// Runs before the body is read, so unauthorized callers never reach the
/// face service.
pub async fn require_session(
    State(state): State<RelayState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok());

    if !state.gate().authorize(token).await {
        warn!(
            uri = %req.uri(),
            has_token = token.is_some(),
            "unauthorized request: invalid or missing session"
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
