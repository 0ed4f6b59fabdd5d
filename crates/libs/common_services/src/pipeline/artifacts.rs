use ab_glyph::{FontArc, PxScale};
use app_state::AnnotationSettings;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_types::{DecodedImage, Detection, SourceContext};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use tracing::warn;

/// Second-resolution timestamp used in every artifact key of a request.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_SCALE: f32 = 20.0;

#[must_use]
pub fn scene_key(source: &SourceContext) -> String {
    format!(
        "{}/{}.jpg",
        source.source_id,
        source.received_at.format(TIMESTAMP_FORMAT)
    )
}

#[must_use]
pub fn plate_key(source: &SourceContext, index: usize) -> String {
    format!(
        "{}/{}_plate_{index}.jpg",
        source.source_id,
        source.received_at.format(TIMESTAMP_FORMAT)
    )
}

#[must_use]
pub fn annotated_key(source: &SourceContext) -> String {
    format!(
        "{}/{}_annotated.jpg",
        source.source_id,
        source.received_at.format(TIMESTAMP_FORMAT)
    )
}

/// The scene's filename without its namespace segment, echoed back to upload
/// clients.
#[must_use]
pub fn scene_file_name(received_at: DateTime<Utc>) -> String {
    format!("{}.jpg", received_at.format(TIMESTAMP_FORMAT))
}

/// One encoded artifact, ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// Everything derived from one scene: the pristine original, one crop per
/// detection (same order), and the annotated overview.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub scene: EncodedArtifact,
    pub plates: Vec<EncodedArtifact>,
    pub annotated: EncodedArtifact,
}

/// Derives and encodes the stored artifacts for a processed scene. Holds the
/// label font, loaded once at startup; without one the annotated scene gets
/// boxes but no confidence labels.
pub struct ArtifactBuilder {
    font: Option<FontArc>,
}

impl ArtifactBuilder {
    #[must_use]
    pub fn from_settings(settings: &AnnotationSettings) -> Self {
        let font = settings.font_path.as_ref().and_then(|path| {
            match std::fs::read(path).map_err(color_eyre::Report::from).and_then(|bytes| {
                FontArc::try_from_vec(bytes).map_err(|e| eyre!("invalid font file: {e}"))
            }) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!(path = %path.display(), "annotation font unavailable, drawing boxes only: {e:#}");
                    None
                }
            }
        });
        Self { font }
    }

    #[must_use]
    pub fn without_font() -> Self {
        Self { font: None }
    }

    /// Builds the full artifact set. Detection order fixes the plate indices.
    pub fn build(
        &self,
        image: &DecodedImage,
        detections: &[Detection],
        source: &SourceContext,
    ) -> Result<ArtifactSet> {
        let scene = EncodedArtifact {
            key: scene_key(source),
            bytes: encode_jpeg(image.as_rgb())?,
        };

        let mut plates = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let crop = image.crop(&detection.bounding_box);
            plates.push(EncodedArtifact {
                key: plate_key(source, index),
                bytes: encode_jpeg(&crop)?,
            });
        }

        let annotated = EncodedArtifact {
            key: annotated_key(source),
            bytes: encode_jpeg(&self.annotate(image, detections))?,
        };

        Ok(ArtifactSet {
            scene,
            plates,
            annotated,
        })
    }

    fn annotate(&self, image: &DecodedImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.as_rgb().clone();
        for detection in detections {
            let bbox = &detection.bounding_box;
            let rect = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            // Second rectangle one pixel in, for a visible 2px outline.
            if bbox.width > 2 && bbox.height > 2 {
                let inner = Rect::at(bbox.x as i32 + 1, bbox.y as i32 + 1)
                    .of_size(bbox.width - 2, bbox.height - 2);
                draw_hollow_rect_mut(&mut canvas, inner, BOX_COLOR);
            }

            if let Some(font) = &self.font {
                let label = format!("plate {:.2}", detection.confidence);
                let label_y = i32::try_from(bbox.y).unwrap_or(i32::MAX) - LABEL_SCALE as i32 - 2;
                draw_text_mut(
                    &mut canvas,
                    BOX_COLOR,
                    bbox.x as i32,
                    label_y.max(0),
                    PxScale::from(LABEL_SCALE),
                    font,
                    &label,
                );
            }
        }
        canvas
    }
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}
