use common::image_payload;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};

use crate::error::ClientError;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_MAX_WIDTH: u32 = 640;
pub const DEFAULT_MAX_HEIGHT: u32 = 480;

/// Turns raw frames into the base64 JPEG payload the relay expects.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT, DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder {
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// JPEG-encode `frame`, shrinking it to fit the bounds (aspect kept).
    pub fn encode_jpeg(&self, frame: &DynamicImage) -> Result<Vec<u8>, ClientError> {
        let frame = if frame.width() > self.max_width || frame.height() > self.max_height {
            frame.resize(self.max_width, self.max_height, FilterType::Triangle)
        } else {
            frame.clone()
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode_image(&frame.to_rgb8())?;
        Ok(jpeg)
    }

    pub fn encode(&self, frame: &DynamicImage) -> Result<String, ClientError> {
        Ok(image_payload::encode(&self.encode_jpeg(frame)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])))
    }

    fn decoded(jpeg: &[u8]) -> DynamicImage {
        image::load_from_memory(jpeg).unwrap()
    }

    #[test]
    fn test_large_frames_are_downscaled_keeping_aspect() {
        let jpeg = FrameEncoder::default().encode_jpeg(&frame(1280, 720)).unwrap();
        let img = decoded(&jpeg);
        assert_eq!((img.width(), img.height()), (640, 360));
    }

    #[test]
    fn test_small_frames_keep_their_size() {
        let jpeg = FrameEncoder::default().encode_jpeg(&frame(320, 240)).unwrap();
        let img = decoded(&jpeg);
        assert_eq!((img.width(), img.height()), (320, 240));
    }

    #[test]
    fn test_payload_is_plain_base64_jpeg() {
        let payload = FrameEncoder::default().encode(&frame(16, 16)).unwrap();
        assert!(!payload.starts_with("data:"));

        let bytes = image_payload::decode(&payload).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
