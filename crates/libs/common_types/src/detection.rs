use serde::{Deserialize, Serialize};

/// Sentinel stored when the OCR engine yields no usable characters for a crop.
/// An unreadable plate is a data-quality outcome, not an error.
pub const UNREADABLE_PLATE: &str = "unreadable";

/// Axis-aligned plate region in original image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Builds a box from float corner coordinates, clamped to the image bounds.
    /// Returns `None` for degenerate boxes (zero width or height after clamping).
    #[must_use]
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32, img_w: u32, img_h: u32) -> Option<Self> {
        let x1 = x1.max(0.0).min(img_w as f32) as u32;
        let y1 = y1.max(0.0).min(img_h as f32) as u32;
        let x2 = x2.max(0.0).min(img_w as f32) as u32;
        let y2 = y2.max(0.0).min(img_h as f32) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }
}

/// One candidate plate region, before OCR. Ordering of a detection batch is
/// model output order; the orchestrator assigns the stable index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub confidence: f32,
}

/// OCR outcome for one detection's cropped region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateReading {
    /// Normalized plate text, or [`UNREADABLE_PLATE`]. Never an empty string.
    pub text: String,
    pub confidence: f32,
}

impl PlateReading {
    #[must_use]
    pub fn readable(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    #[must_use]
    pub fn unreadable() -> Self {
        Self {
            text: UNREADABLE_PLATE.to_string(),
            confidence: 0.0,
        }
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.text != UNREADABLE_PLATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_clamped_to_image_bounds() {
        let bbox = BoundingBox::from_corners(-10.0, 5.0, 50.0, 500.0, 40, 100).expect("valid box");
        assert_eq!(bbox, BoundingBox { x: 0, y: 5, width: 40, height: 95 });
    }

    #[test]
    fn degenerate_boxes_are_rejected() {
        assert!(BoundingBox::from_corners(30.0, 10.0, 30.0, 20.0, 100, 100).is_none());
        assert!(BoundingBox::from_corners(90.0, 10.0, 80.0, 20.0, 100, 100).is_none());
        // Fully outside the image collapses to zero size after clamping.
        assert!(BoundingBox::from_corners(150.0, 150.0, 200.0, 200.0, 100, 100).is_none());
    }

    #[test]
    fn unreadable_reading_uses_the_sentinel() {
        let reading = PlateReading::unreadable();
        assert_eq!(reading.text, UNREADABLE_PLATE);
        assert!(!reading.is_readable());
        assert_eq!(reading.confidence, 0.0);
    }
}
