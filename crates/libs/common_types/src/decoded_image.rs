use crate::BoundingBox;
use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not decode image bytes: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// An immutable 3-channel pixel buffer for one pipeline run. Artifact
/// derivation always copies; the pristine buffer is never mutated.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    /// Decodes raw bytes (JPEG, PNG, WebP, ...) into an RGB buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self {
            pixels: decoded.to_rgb8(),
        })
    }

    #[must_use]
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Copies the region under a bounding box out of the pristine buffer.
    #[must_use]
    pub fn crop(&self, bbox: &BoundingBox) -> RgbImage {
        image::imageops::crop_imm(&self.pixels, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
    }
}
