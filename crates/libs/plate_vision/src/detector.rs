use app_state::DetectionSettings;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_types::{BoundingBox, Detection};
use image::RgbImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::debug;

/// Finds candidate plate regions in a decoded image.
///
/// Returns detections in model output order, already filtered by the
/// configured confidence threshold. An image with no plates yields an empty
/// vec, never an error.
pub trait PlateDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>>;
}

/// Single-class YOLO-style plate model in `.rten` format, loaded once per
/// process and shared read-only across requests.
pub struct RtenPlateDetector {
    model: Model,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl RtenPlateDetector {
    pub fn from_settings(settings: &DetectionSettings) -> Result<Self> {
        let model = Model::load_file(&settings.model_path)?;
        Ok(Self {
            model,
            input_size: settings.input_size,
            confidence_threshold: settings.confidence_threshold,
            iou_threshold: settings.iou_threshold,
        })
    }
}

impl PlateDetector for RtenPlateDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let letterbox = Letterbox::fit(image.dimensions(), self.input_size);
        let input = letterbox_to_tensor(image, &letterbox);

        let output = self
            .model
            .run_one(input.into(), None)
            .map_err(|e| eyre!("plate model inference failed: {e}"))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|_| eyre!("plate model returned an unexpected output shape"))?;

        let [_, rows, cols] = output.shape();
        let candidates = decode_predictions(
            &output.to_vec(),
            rows,
            cols,
            self.confidence_threshold,
            &letterbox,
            image.dimensions(),
        )?;
        let detections = non_max_suppression(candidates, self.iou_threshold);
        debug!(count = detections.len(), "plate detection finished");
        Ok(detections)
    }
}

/// How the source image was scaled and padded into the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub scaled_w: u32,
    pub scaled_h: u32,
    pub input_size: u32,
}

impl Letterbox {
    #[must_use]
    pub fn fit((width, height): (u32, u32), input_size: u32) -> Self {
        let scale = (input_size as f32 / width as f32).min(input_size as f32 / height as f32);
        let scaled_w = ((width as f32 * scale).round() as u32).clamp(1, input_size);
        let scaled_h = ((height as f32 * scale).round() as u32).clamp(1, input_size);
        Self {
            scale,
            pad_x: (input_size - scaled_w) / 2,
            pad_y: (input_size - scaled_h) / 2,
            scaled_w,
            scaled_h,
            input_size,
        }
    }

    /// Maps a coordinate from model input space back to source pixel space.
    #[must_use]
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }
}

fn letterbox_to_tensor(image: &RgbImage, letterbox: &Letterbox) -> NdTensor<f32, 4> {
    let size = letterbox.input_size as usize;
    let resized = image::imageops::resize(
        image,
        letterbox.scaled_w,
        letterbox.scaled_h,
        FilterType::Triangle,
    );

    // CHW planes, zero padding outside the letterboxed region.
    let mut data = vec![0.0f32; 3 * size * size];
    let plane = size * size;
    for (x, y, pixel) in resized.enumerate_pixels() {
        let row = (y + letterbox.pad_y) as usize;
        let col = (x + letterbox.pad_x) as usize;
        for channel in 0..3 {
            data[channel * plane + row * size + col] = f32::from(pixel[channel]) / 255.0;
        }
    }
    NdTensor::from_data([1, 3, size, size], data)
}

/// Decodes raw YOLO output into thresholded detections in source pixel space.
///
/// Handles both `[1, 5, N]` (attributes-first, YOLOv8 export layout) and
/// `[1, N, 5]` row layouts; each prediction is `(cx, cy, w, h, score)` in
/// model input coordinates. A shape matching neither layout is an error.
pub fn decode_predictions(
    values: &[f32],
    rows: usize,
    cols: usize,
    confidence_threshold: f32,
    letterbox: &Letterbox,
    (img_w, img_h): (u32, u32),
) -> Result<Vec<Detection>> {
    let attributes_first = rows == 5;
    if !attributes_first && cols < 5 {
        return Err(eyre!(
            "plate model output shape [1, {rows}, {cols}] has no (cx, cy, w, h, score) axis"
        ));
    }
    let count = if attributes_first { cols } else { rows };
    let attr = |i: usize, a: usize| {
        if attributes_first {
            values[a * cols + i]
        } else {
            values[i * cols + a]
        }
    };

    let mut detections = Vec::new();
    for i in 0..count {
        let confidence = attr(i, 4);
        if confidence < confidence_threshold {
            continue;
        }
        let (cx, cy, w, h) = (attr(i, 0), attr(i, 1), attr(i, 2), attr(i, 3));
        let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);
        if let Some(bounding_box) = BoundingBox::from_corners(x1, y1, x2, y2, img_w, img_h) {
            detections.push(Detection {
                bounding_box,
                confidence,
            });
        }
    }
    Ok(detections)
}

/// Greedy IoU-based non-maximum suppression, highest confidence first.
#[must_use]
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| iou(&k.bounding_box, &candidate.bounding_box) < iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);
    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }
    let intersection = ((x2 - x1) * (y2 - y1)) as f32;
    let union = (a.width * a.height + b.width * b.height) as f32 - intersection;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: u32, y: u32, w: u32, h: u32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn letterbox_centers_a_wide_image() {
        let letterbox = Letterbox::fit((640, 320), 320);
        assert_eq!(letterbox.scaled_w, 320);
        assert_eq!(letterbox.scaled_h, 160);
        assert_eq!(letterbox.pad_x, 0);
        assert_eq!(letterbox.pad_y, 80);

        // Input-space center maps back to source-space center.
        let (x, y) = letterbox.unmap(160.0, 160.0);
        assert!((x - 320.0).abs() < 1.0);
        assert!((y - 160.0).abs() < 1.0);
    }

    #[test]
    fn decode_filters_below_threshold_and_maps_back() {
        let letterbox = Letterbox::fit((320, 320), 320);
        // Attributes-first layout [1, 5, 2]: two predictions.
        #[rustfmt::skip]
        let values = vec![
            160.0, 100.0, // cx
            160.0, 100.0, // cy
            80.0, 40.0,   // w
            40.0, 20.0,   // h
            0.9, 0.3,     // score
        ];
        let detections =
            decode_predictions(&values, 5, 2, 0.5, &letterbox, (320, 320)).expect("valid layout");
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bounding_box, bbox(120, 140, 80, 40));
        assert!((detections[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn decode_handles_rows_first_layout() {
        let letterbox = Letterbox::fit((320, 320), 320);
        let values = vec![160.0, 160.0, 80.0, 40.0, 0.8];
        let detections =
            decode_predictions(&values, 1, 5, 0.5, &letterbox, (320, 320)).expect("valid layout");
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bounding_box, bbox(120, 140, 80, 40));
    }

    #[test]
    fn decode_rejects_outputs_without_a_prediction_axis() {
        let letterbox = Letterbox::fit((320, 320), 320);
        // [1, 3, 4] matches neither layout; indexing it as predictions
        // would read past the buffer.
        let values = vec![0.0; 12];
        assert!(decode_predictions(&values, 3, 4, 0.5, &letterbox, (320, 320)).is_err());
    }

    #[test]
    fn nms_drops_overlapping_lower_confidence_boxes() {
        let candidates = vec![
            Detection {
                bounding_box: bbox(10, 10, 100, 50),
                confidence: 0.7,
            },
            Detection {
                bounding_box: bbox(12, 12, 100, 50),
                confidence: 0.9,
            },
            Detection {
                bounding_box: bbox(300, 300, 60, 30),
                confidence: 0.6,
            },
        ];
        let kept = non_max_suppression(candidates, 0.45);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(kept[1].bounding_box, bbox(300, 300, 60, 30));
    }

    #[test]
    fn disjoint_boxes_have_zero_iou() {
        assert_eq!(iou(&bbox(0, 0, 10, 10), &bbox(20, 20, 10, 10)), 0.0);
    }
}
