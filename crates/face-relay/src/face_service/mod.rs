pub mod mock;
pub mod rekognition;

use async_trait::async_trait;
use common::analysis::{FaceAttributes, IdentityMatch};
use thiserror::Error;

/// A remote call failed. "Nothing found" is never an error: it is an empty
/// face list or `None` match.
#[derive(Debug, Clone, Error)]
pub enum FaceServiceError {
    #[error("face detection failed: {0}")]
    Detect(String),

    #[error("face search failed: {0}")]
    Search(String),
}

/// The two operations the relay needs from a face detection/search provider.
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Detect every face in `image` with all attributes requested.
    async fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceAttributes>, FaceServiceError>;

    /// Search `collection_id` for the face in `image`, returning at most one
    /// match at or above `threshold` percent similarity.
    async fn search_face_by_image(
        &self,
        image: &[u8],
        collection_id: &str,
        threshold: f32,
    ) -> Result<Option<IdentityMatch>, FaceServiceError>;
}
