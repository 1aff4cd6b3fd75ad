//! Face analysis contracts returned by the relay for every captured frame.
//!
//! Attribute names follow the remote detector's own PascalCase vocabulary so a
//! browser client can render the payload without a translation table.

use serde::{Deserialize, Serialize};

/// Predicted gender with the detector's confidence (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenderAttribute {
    pub value: String,
    pub confidence: f32,
}

/// Estimated age range in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgeRange {
    pub low: u32,
    pub high: u32,
}

/// One emotion label with its confidence (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmotionScore {
    #[serde(rename = "Type")]
    pub kind: String,
    pub confidence: f32,
}

/// Boolean attribute (smile, eyeglasses, ...) with confidence (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlagAttribute {
    pub value: bool,
    pub confidence: f32,
}

impl FlagAttribute {
    pub fn new(value: bool, confidence: f32) -> Self {
        Self { value, confidence }
    }
}

/// Attributes of a single detected face.
///
/// Passed through from the detector as-is; every field is optional and only
/// checked for presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceAttributes {
    /// Detection confidence for the face itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<GenderAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,

    #[serde(default)]
    pub emotions: Vec<EmotionScore>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smile: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyeglasses: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunglasses: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beard: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mustache: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes_open: Option<FlagAttribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth_open: Option<FlagAttribute>,
}

impl FaceAttributes {
    /// Emotions ordered by descending confidence, truncated to `n`.
    pub fn top_emotions(&self, n: usize) -> Vec<&EmotionScore> {
        let mut emotions: Vec<&EmotionScore> = self.emotions.iter().collect();
        emotions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        emotions.truncate(n);
        emotions
    }

    /// The boolean attributes in display order, paired with their labels.
    pub fn flags(&self) -> [(&'static str, Option<&FlagAttribute>); 7] {
        [
            ("Smile", self.smile.as_ref()),
            ("Eyeglasses", self.eyeglasses.as_ref()),
            ("Sunglasses", self.sunglasses.as_ref()),
            ("Beard", self.beard.as_ref()),
            ("Mustache", self.mustache.as_ref()),
            ("Eyes Open", self.eyes_open.as_ref()),
            ("Mouth Open", self.mouth_open.as_ref()),
        ]
    }
}

/// A claim that the detected face matches a face enrolled in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMatch {
    /// Identifier the remote service assigned to the enrolled face
    #[serde(default)]
    pub face_id: Option<String>,

    /// Label attached to the enrolled face at indexing time (usually a name)
    #[serde(default)]
    pub external_image_id: Option<String>,

    /// Similarity score in percent
    pub similarity: f32,
}

impl IdentityMatch {
    /// Human-readable label of the matched identity.
    pub fn label(&self) -> &str {
        self.external_image_id
            .as_deref()
            .or(self.face_id.as_deref())
            .unwrap_or("unknown")
    }
}

/// Result of analyzing one captured frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub face_detected: bool,
    pub identity: Option<IdentityMatch>,
    pub attributes: Option<FaceAttributes>,
}

impl AnalysisResult {
    pub fn no_face() -> Self {
        Self {
            face_detected: false,
            identity: None,
            attributes: None,
        }
    }

    pub fn detected(attributes: FaceAttributes, identity: Option<IdentityMatch>) -> Self {
        Self {
            face_detected: true,
            identity,
            attributes: Some(attributes),
        }
    }
}
