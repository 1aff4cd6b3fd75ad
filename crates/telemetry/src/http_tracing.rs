use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Instrument};

use crate::correlation::{extract_or_generate_correlation_id, X_CORRELATION_ID, X_REQUEST_ID};

/// Axum middleware for HTTP request tracing
pub async fn trace_http_request(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let correlation_id = extract_or_generate_correlation_id(req.headers());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        correlation_id = %correlation_id,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(req).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    span.record("status", status.as_u16());
    span.record("latency_ms", latency_ms);

    let _enter = span.enter();
    if status.is_server_error() {
        error!(method = %method, uri = %uri, status = %status.as_u16(), latency_ms = %latency_ms, "HTTP request failed (server error)");
    } else if status.is_client_error() {
        warn!(method = %method, uri = %uri, status = %status.as_u16(), latency_ms = %latency_ms, "HTTP request failed (client error)");
    } else {
        info!(method = %method, uri = %uri, status = %status.as_u16(), latency_ms = %latency_ms, "HTTP request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(X_CORRELATION_ID, value);
    }

    response
}

/// Create the HTTP client used for calls to the relay
pub fn create_traced_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("facewatch/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(3));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Helper to add correlation ID to outgoing HTTP requests
pub fn add_correlation_id_header(
    request: reqwest::RequestBuilder,
    correlation_id: &str,
) -> reqwest::RequestBuilder {
    request
        .header(X_CORRELATION_ID, correlation_id)
        .header(X_REQUEST_ID, correlation_id)
}
