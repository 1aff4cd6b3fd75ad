use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::api::{ErrorResponse, LoginResponse};
use thiserror::Error;

use crate::{face_service::FaceServiceError, session::LoginError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("login rejected: {0}")]
    Login(#[from] LoginError),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("analysis failed: {0}")]
    Analysis(#[from] FaceServiceError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Login(LoginError::MissingPassword) => StatusCode::BAD_REQUEST,
            ApiError::Login(LoginError::InvalidPassword) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Analysis(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error = |error: &str, details: Option<String>| {
            Json(ErrorResponse {
                error: error.to_string(),
                details,
            })
            .into_response()
        };

        let body = match self {
            ApiError::BadRequest(msg) => error(&msg, None),
            ApiError::Unauthorized => error("Unauthorized", None),
            // login keeps the {success, message} envelope the client expects
            ApiError::Login(err) => Json(LoginResponse::rejected(err.to_string())).into_response(),
            ApiError::PayloadTooLarge => error("Request body too large", None),
            ApiError::Analysis(err) => error("Failed to analyze face", Some(err.to_string())),
            ApiError::Internal(msg) => error(&msg, None),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(LoginError::MissingPassword).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LoginError::InvalidPassword).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(FaceServiceError::Detect("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
