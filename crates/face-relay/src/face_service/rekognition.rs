use async_trait::async_trait;
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_rekognition::{
    config::Builder as RekognitionConfigBuilder,
    error::DisplayErrorContext,
    primitives::Blob,
    types::{Attribute, FaceDetail, FaceMatch, Image},
    Client,
};
use common::analysis::{
    AgeRange, EmotionScore, FaceAttributes, FlagAttribute, GenderAttribute, IdentityMatch,
};
use tracing::{debug, instrument};

use super::{FaceService, FaceServiceError};
use crate::config::FaceServiceConfig;

/// Face service backed by AWS Rekognition.
pub struct RekognitionFaceService {
    client: Client,
}

impl RekognitionFaceService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client for the configured region, using static credentials when
    /// both keys are present and the default provider chain otherwise.
    pub async fn from_config(cfg: &FaceServiceConfig) -> Self {
        let region = Region::new(cfg.region.clone());
        let region_provider = RegionProviderChain::first_try(region.clone()).or_default_provider();
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut conf = RekognitionConfigBuilder::from(&base).region(region);
        if let (Some(access_key), Some(secret_key)) = (&cfg.access_key_id, &cfg.secret_access_key) {
            conf = conf.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "static",
            ));
        }
        if let Some(endpoint) = &cfg.endpoint_url {
            conf = conf.endpoint_url(endpoint.clone());
        }

        Self::new(Client::from_conf(conf.build()))
    }
}

fn image(bytes: &[u8]) -> Image {
    Image::builder().bytes(Blob::new(bytes.to_vec())).build()
}

fn flag(value: Option<bool>, confidence: Option<f32>) -> Option<FlagAttribute> {
    Some(FlagAttribute::new(value?, confidence.unwrap_or_default()))
}

fn face_attributes(detail: &FaceDetail) -> FaceAttributes {
    FaceAttributes {
        confidence: detail.confidence(),
        gender: detail.gender().and_then(|g| {
            Some(GenderAttribute {
                value: g.value()?.as_str().to_string(),
                confidence: g.confidence().unwrap_or_default(),
            })
        }),
        age_range: detail.age_range().and_then(|r| {
            Some(AgeRange {
                low: u32::try_from(r.low()?).ok()?,
                high: u32::try_from(r.high()?).ok()?,
            })
        }),
        emotions: detail
            .emotions()
            .iter()
            .filter_map(|e| {
                Some(EmotionScore {
                    kind: e.r#type()?.as_str().to_string(),
                    confidence: e.confidence().unwrap_or_default(),
                })
            })
            .collect(),
        smile: detail.smile().and_then(|a| flag(Some(a.value()), a.confidence())),
        eyeglasses: detail.eyeglasses().and_then(|a| flag(Some(a.value()), a.confidence())),
        sunglasses: detail.sunglasses().and_then(|a| flag(Some(a.value()), a.confidence())),
        beard: detail.beard().and_then(|a| flag(Some(a.value()), a.confidence())),
        mustache: detail.mustache().and_then(|a| flag(Some(a.value()), a.confidence())),
        eyes_open: detail.eyes_open().and_then(|a| flag(Some(a.value()), a.confidence())),
        mouth_open: detail.mouth_open().and_then(|a| flag(Some(a.value()), a.confidence())),
    }
}

fn identity_match(face_match: &FaceMatch) -> IdentityMatch {
    let face = face_match.face();
    IdentityMatch {
        face_id: face.and_then(|f| f.face_id()).map(str::to_string),
        external_image_id: face.and_then(|f| f.external_image_id()).map(str::to_string),
        similarity: face_match.similarity().unwrap_or_default(),
    }
}

#[async_trait]
impl FaceService for RekognitionFaceService {
    fn name(&self) -> &'static str {
        "rekognition"
    }

    #[instrument(skip_all, fields(image_bytes = image_bytes.len()))]
    async fn detect_faces(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<FaceAttributes>, FaceServiceError> {
        let output = self
            .client
            .detect_faces()
            .image(image(image_bytes))
            .attributes(Attribute::All)
            .send()
            .await
            .map_err(|e| FaceServiceError::Detect(DisplayErrorContext(&e).to_string()))?;

        debug!(faces = output.face_details().len(), "DetectFaces response received");
        Ok(output.face_details().iter().map(face_attributes).collect())
    }

    #[instrument(skip_all, fields(collection = %collection_id, threshold = %threshold))]
    async fn search_face_by_image(
        &self,
        image_bytes: &[u8],
        collection_id: &str,
        threshold: f32,
    ) -> Result<Option<IdentityMatch>, FaceServiceError> {
        let output = self
            .client
            .search_faces_by_image()
            .collection_id(collection_id)
            .image(image(image_bytes))
            .max_faces(1)
            .face_match_threshold(threshold)
            .send()
            .await
            .map_err(|e| FaceServiceError::Search(DisplayErrorContext(&e).to_string()))?;

        debug!(matches = output.face_matches().len(), "SearchFacesByImage response received");
        Ok(output.face_matches().first().map(identity_match))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rekognition::types::{
        AgeRange as AwsAgeRange, Emotion, EmotionName, Face, Gender, GenderType, Smile,
    };

    #[test]
    fn test_face_detail_mapping() {
        let detail = FaceDetail::builder()
            .confidence(99.5)
            .gender(
                Gender::builder()
                    .value(GenderType::Female)
                    .confidence(97.0)
                    .build(),
            )
            .age_range(AwsAgeRange::builder().low(21).high(29).build())
            .emotions(
                Emotion::builder()
                    .r#type(EmotionName::Happy)
                    .confidence(88.0)
                    .build(),
            )
            .smile(Smile::builder().value(true).confidence(91.0).build())
            .build();

        let attrs = face_attributes(&detail);
        assert_eq!(attrs.confidence, Some(99.5));
        assert_eq!(attrs.gender.unwrap().value, "Female");
        assert_eq!(attrs.age_range, Some(AgeRange { low: 21, high: 29 }));
        assert_eq!(attrs.emotions[0].kind, "HAPPY");
        assert_eq!(attrs.smile, Some(FlagAttribute::new(true, 91.0)));
        assert!(attrs.beard.is_none());
    }

    #[test]
    fn test_face_match_mapping() {
        let face_match = FaceMatch::builder()
            .similarity(93.5)
            .face(
                Face::builder()
                    .face_id("11111111-2222-3333-4444-555555555555")
                    .external_image_id("alice")
                    .build(),
            )
            .build();

        let identity = identity_match(&face_match);
        assert_eq!(identity.external_image_id.as_deref(), Some("alice"));
        assert_eq!(identity.similarity, 93.5);
    }
}
