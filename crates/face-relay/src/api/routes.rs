use crate::{error::ApiError, state::RelayState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use common::{
    analysis::AnalysisResult,
    api::{
        AnalyzeRequest, ConfigResponse, HealthResponse, LoginRequest, LoginResponse,
        SubmittedPassword,
    },
    image_payload,
};
use telemetry::metrics::RELAY_ANALYZE_REQUESTS;
use tracing::{debug, error, info};

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Client configuration (capture interval)
pub async fn config(State(state): State<RelayState>) -> Json<ConfigResponse> {
    Json(state.client_config().clone())
}

/// Exchange the shared password for a session token
pub async fn login(
    State(state): State<RelayState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // an unreadable body is treated like one without a password
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let token = match request.submitted_password() {
        SubmittedPassword::Absent => state.gate().login(None).await?,
        SubmittedPassword::Text(password) => state.gate().login(Some(password)).await?,
        SubmittedPassword::Other => return Err(state.gate().reject().into()),
    };
    Ok(Json(LoginResponse::granted(token)))
}

/// Analyze one captured frame (session required)
pub async fn analyze_face(
    State(state): State<RelayState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            RELAY_ANALYZE_REQUESTS.with_label_values(&["rejected"]).inc();
            return Err(ApiError::PayloadTooLarge);
        }
        Err(rejection) => {
            debug!(error = %rejection, "unreadable analyze body");
            AnalyzeRequest::default()
        }
    };

    let Some(image) = request.image.filter(|image| !image.is_empty()) else {
        RELAY_ANALYZE_REQUESTS.with_label_values(&["rejected"]).inc();
        error!("no image provided in request body");
        return Err(ApiError::bad_request("No image provided"));
    };
    info!(base64_len = image.len(), "image received");

    let bytes = image_payload::decode(&image).map_err(|e| {
        RELAY_ANALYZE_REQUESTS.with_label_values(&["rejected"]).inc();
        debug!(error = %e, "image payload is not valid base64");
        ApiError::bad_request("Invalid base64 image data")
    })?;

    match state.analyzer().analyze(&bytes).await {
        Ok(result) => {
            let outcome = if result.face_detected { "face" } else { "no_face" };
            RELAY_ANALYZE_REQUESTS.with_label_values(&[outcome]).inc();
            Ok(Json(result))
        }
        Err(err) => {
            RELAY_ANALYZE_REQUESTS.with_label_values(&["failed"]).inc();
            error!(error = %err, "face analysis failed");
            Err(err.into())
        }
    }
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics() -> Result<String, ApiError> {
    telemetry::metrics::encode_metrics()
        .map_err(|e| ApiError::internal(format!("failed to encode metrics: {}", e)))
}
