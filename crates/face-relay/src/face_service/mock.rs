//! Scripted face service for tests and credential-free demos
use async_trait::async_trait;
use common::analysis::{
    AgeRange, EmotionScore, FaceAttributes, FlagAttribute, GenderAttribute, IdentityMatch,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{FaceService, FaceServiceError};

/// A plausible single-face detection result.
pub fn sample_face() -> FaceAttributes {
    FaceAttributes {
        confidence: Some(99.9),
        gender: Some(GenderAttribute {
            value: "Male".to_string(),
            confidence: 99.2,
        }),
        age_range: Some(AgeRange { low: 28, high: 36 }),
        emotions: vec![
            EmotionScore {
                kind: "CALM".to_string(),
                confidence: 91.4,
            },
            EmotionScore {
                kind: "HAPPY".to_string(),
                confidence: 4.1,
            },
            EmotionScore {
                kind: "CONFUSED".to_string(),
                confidence: 2.2,
            },
        ],
        smile: Some(FlagAttribute::new(false, 96.8)),
        eyeglasses: Some(FlagAttribute::new(true, 97.5)),
        sunglasses: Some(FlagAttribute::new(false, 99.6)),
        beard: Some(FlagAttribute::new(false, 88.0)),
        mustache: Some(FlagAttribute::new(false, 93.3)),
        eyes_open: Some(FlagAttribute::new(true, 98.1)),
        mouth_open: Some(FlagAttribute::new(false, 95.7)),
    }
}

/// Recorded arguments of a search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub collection_id: String,
    pub threshold: f32,
    pub image_len: usize,
}

pub struct MockFaceService {
    faces: Vec<FaceAttributes>,
    identity: Option<IdentityMatch>,
    detect_failure: Option<String>,
    search_failure: Option<String>,
    latency: Duration,
    detect_calls: AtomicUsize,
    search_calls: AtomicUsize,
    last_search: Mutex<Option<SearchCall>>,
}

impl MockFaceService {
    /// One sample face, no identity match.
    pub fn new() -> Self {
        Self {
            faces: vec![sample_face()],
            identity: None,
            detect_failure: None,
            search_failure: None,
            latency: Duration::ZERO,
            detect_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            last_search: Mutex::new(None),
        }
    }

    pub fn with_faces(mut self, faces: Vec<FaceAttributes>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_no_faces(self) -> Self {
        self.with_faces(Vec::new())
    }

    pub fn with_identity(mut self, identity: IdentityMatch) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn failing_detection(mut self, message: impl Into<String>) -> Self {
        self.detect_failure = Some(message.into());
        self
    }

    pub fn failing_search(mut self, message: impl Into<String>) -> Self {
        self.search_failure = Some(message.into());
        self
    }

    /// Delay every call, to simulate a slow provider
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.detect_calls() + self.search_calls()
    }

    pub async fn last_search(&self) -> Option<SearchCall> {
        self.last_search.lock().await.clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockFaceService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceService for MockFaceService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn detect_faces(&self, _image: &[u8]) -> Result<Vec<FaceAttributes>, FaceServiceError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        match &self.detect_failure {
            Some(message) => Err(FaceServiceError::Detect(message.clone())),
            None => Ok(self.faces.clone()),
        }
    }

    async fn search_face_by_image(
        &self,
        image: &[u8],
        collection_id: &str,
        threshold: f32,
    ) -> Result<Option<IdentityMatch>, FaceServiceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().await = Some(SearchCall {
            collection_id: collection_id.to_string(),
            threshold,
            image_len: image.len(),
        });
        self.simulate_latency().await;

        if let Some(message) = &self.search_failure {
            return Err(FaceServiceError::Search(message.clone()));
        }

        Ok(self
            .identity
            .clone()
            .filter(|identity| identity.similarity >= threshold))
    }
}
