use crate::preprocess_crop;
use app_state::OcrSettings;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_types::PlateReading;
use image::{DynamicImage, RgbImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::debug;

/// Reads plate text from one detection's cropped region.
///
/// An empty OCR result is a data-quality outcome, reported as the unreadable
/// sentinel reading, never as an error.
pub trait PlateReader: Send + Sync {
    fn read(&self, crop: &RgbImage) -> Result<PlateReading>;
}

/// ocrs text detection + recognition models, loaded once per process.
pub struct OcrsPlateReader {
    engine: OcrEngine,
    default_confidence: f32,
}

impl OcrsPlateReader {
    pub fn from_settings(settings: &OcrSettings) -> Result<Self> {
        let detection_model = Model::load_file(&settings.detection_model_path)?;
        let recognition_model = Model::load_file(&settings.recognition_model_path)?;

        // ocrs reports errors through anyhow, which does not convert to an
        // eyre report with `?`.
        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| eyre!("ocr engine init failed: {e}"))?;

        Ok(Self {
            engine,
            default_confidence: settings.default_confidence,
        })
    }
}

impl PlateReader for OcrsPlateReader {
    fn read(&self, crop: &RgbImage) -> Result<PlateReading> {
        let prepared = preprocess_crop(crop);
        let rgb = DynamicImage::ImageLuma8(prepared).to_rgb8();

        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| eyre!("ocr input preparation failed: {e}"))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|e| eyre!("ocr text extraction failed: {e}"))?;

        let plate = normalize_plate_text(&text);
        debug!(raw = %text.trim(), normalized = %plate, "ocr finished");
        if plate.is_empty() {
            Ok(PlateReading::unreadable())
        } else {
            // The engine exposes no per-line certainty through get_text.
            Ok(PlateReading::readable(plate, self.default_confidence))
        }
    }
}

/// Keeps only characters that can appear on a plate: ASCII letters and
/// digits, uppercased. Whitespace, punctuation and OCR garbage are dropped.
#[must_use]
pub fn normalize_plate_text(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
