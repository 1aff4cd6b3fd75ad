use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay no longer recognizes the session token
    #[error("session expired or invalid")]
    Unauthorized,

    #[error("login rejected: {0}")]
    LoginRejected(String),

    #[error("Server error: {status} ({message})")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid relay endpoint: {0}")]
    Endpoint(String),

    #[error("could not access camera: {0}")]
    Camera(String),

    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
