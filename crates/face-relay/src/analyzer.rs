//! Detect-then-search orchestration for a single captured frame.
//!
//! Only the first reported face is analyzed; additional faces in the frame
//! are ignored. Detection failures abort the analysis. Search failures
//! degrade to "no identity" and never fail the request.

use common::analysis::{AnalysisResult, FaceAttributes, IdentityMatch};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::face_service::{FaceService, FaceServiceError};

const OP_DETECT: &str = "detect_faces";
const OP_SEARCH: &str = "search_face_by_image";

pub struct Analyzer {
    service: Arc<dyn FaceService>,
    collection_id: String,
    face_match_threshold: f32,
}

impl Analyzer {
    pub fn new(
        service: Arc<dyn FaceService>,
        collection_id: impl Into<String>,
        face_match_threshold: f32,
    ) -> Self {
        Self {
            service,
            collection_id: collection_id.into(),
            face_match_threshold,
        }
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn face_match_threshold(&self) -> f32 {
        self.face_match_threshold
    }

    #[instrument(skip_all, fields(provider = self.service.name(), image_bytes = image.len()))]
    pub async fn analyze(&self, image: &[u8]) -> Result<AnalysisResult, FaceServiceError> {
        let faces = self.detect(image).await?;
        let face_count = faces.len();

        let Some(attributes) = faces.into_iter().next() else {
            info!("no face detected in image");
            return Ok(AnalysisResult::no_face());
        };
        log_attributes(face_count, &attributes);

        let identity = match self.search(image).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "identity search failed, returning attributes without identity");
                None
            }
        };

        match &identity {
            Some(m) => info!(identity = %m.label(), similarity = %format!("{:.2}", m.similarity), "identity match found"),
            None => info!("face not found in collection"),
        }

        Ok(AnalysisResult::detected(attributes, identity))
    }

    async fn detect(&self, image: &[u8]) -> Result<Vec<FaceAttributes>, FaceServiceError> {
        let started = Instant::now();
        let result = self.service.detect_faces(image).await;
        record_remote_call(OP_DETECT, result.is_ok(), started);
        result
    }

    async fn search(&self, image: &[u8]) -> Result<Option<IdentityMatch>, FaceServiceError> {
        let started = Instant::now();
        let result = self
            .service
            .search_face_by_image(image, &self.collection_id, self.face_match_threshold)
            .await;
        record_remote_call(OP_SEARCH, result.is_ok(), started);
        result
    }
}

fn record_remote_call(operation: &str, ok: bool, started: Instant) {
    let status = if ok { "success" } else { "error" };
    telemetry::metrics::RELAY_REMOTE_CALLS
        .with_label_values(&[operation, status])
        .inc();
    telemetry::metrics::RELAY_REMOTE_CALL_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

fn log_attributes(face_count: usize, attributes: &FaceAttributes) {
    let emotions: Vec<&str> = attributes
        .top_emotions(2)
        .into_iter()
        .map(|e| e.kind.as_str())
        .collect();
    info!(
        faces = face_count,
        gender = attributes.gender.as_ref().map(|g| g.value.as_str()).unwrap_or("-"),
        age_low = attributes.age_range.map(|r| r.low),
        age_high = attributes.age_range.map(|r| r.high),
        emotions = %emotions.join(", "),
        "face attributes extracted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_service::mock::{sample_face, MockFaceService};
    use common::analysis::GenderAttribute;

    fn alice(similarity: f32) -> IdentityMatch {
        IdentityMatch {
            face_id: Some("face-1".to_string()),
            external_image_id: Some("alice".to_string()),
            similarity,
        }
    }

    fn analyzer(service: Arc<MockFaceService>) -> Analyzer {
        Analyzer::new(service, "staff", 80.0)
    }

    #[tokio::test]
    async fn test_no_face_skips_search() {
        let service = Arc::new(MockFaceService::new().with_no_faces());
        let result = analyzer(service.clone()).analyze(b"frame").await.unwrap();

        assert_eq!(result, AnalysisResult::no_face());
        assert_eq!(service.detect_calls(), 1);
        assert_eq!(service.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_uses_first_face_only() {
        let mut second = sample_face();
        second.gender = Some(GenderAttribute {
            value: "Female".to_string(),
            confidence: 90.0,
        });
        let service = Arc::new(MockFaceService::new().with_faces(vec![sample_face(), second]));

        let result = analyzer(service.clone()).analyze(b"frame").await.unwrap();

        assert!(result.face_detected);
        assert_eq!(result.attributes, Some(sample_face()));
        assert_eq!(service.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_identity_match_is_returned() {
        let service = Arc::new(MockFaceService::new().with_identity(alice(97.0)));
        let result = analyzer(service.clone()).analyze(b"frame").await.unwrap();

        assert_eq!(result.identity, Some(alice(97.0)));
        let call = service.last_search().await.unwrap();
        assert_eq!(call.collection_id, "staff");
        assert_eq!(call.threshold, 80.0);
        assert_eq!(call.image_len, 5);
    }

    #[tokio::test]
    async fn test_match_below_threshold_is_no_identity() {
        let service = Arc::new(MockFaceService::new().with_identity(alice(60.0)));
        let result = analyzer(service).analyze(b"frame").await.unwrap();

        assert!(result.face_detected);
        assert!(result.identity.is_none());
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_no_identity() {
        let service = Arc::new(
            MockFaceService::new()
                .with_identity(alice(99.0))
                .failing_search("ResourceNotFoundException: collection missing"),
        );
        let result = analyzer(service.clone()).analyze(b"frame").await.unwrap();

        assert!(result.face_detected);
        assert!(result.identity.is_none());
        assert!(result.attributes.is_some());
        assert_eq!(service.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_detection_failure_is_fatal() {
        let service = Arc::new(MockFaceService::new().failing_detection("throttled"));
        let err = analyzer(service.clone()).analyze(b"frame").await.unwrap_err();

        assert!(matches!(err, FaceServiceError::Detect(ref msg) if msg == "throttled"));
        assert_eq!(service.search_calls(), 0);
    }
}
