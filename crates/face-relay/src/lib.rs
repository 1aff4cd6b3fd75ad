pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod face_service;
pub mod session;
pub mod state;

pub use analyzer::Analyzer;
pub use config::{FaceBackend, FaceServiceConfig, RelayConfig};
pub use error::ApiError;
pub use face_service::{
    mock::MockFaceService, rekognition::RekognitionFaceService, FaceService, FaceServiceError,
};
pub use session::{SessionGate, SessionStore};
pub use state::RelayState;
