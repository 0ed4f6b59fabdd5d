use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored image derived from a processed request. `public_url` is `None`
/// when the upload failed; a missing URL never aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageArtifact {
    pub key: String,
    pub public_url: Option<String>,
}

impl StorageArtifact {
    #[must_use]
    pub fn unuploaded(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationStatus {
    New,
    NoPlateDetected,
}

impl ViolationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::NoPlateDetected => "no_plate_detected",
        }
    }
}

/// The persisted unit: one row per detection, or one degenerate row with null
/// plate fields when an image had no detections at all. Every processed image
/// yields at least one traceable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewViolation {
    pub camera_id: String,
    pub plate_text: Option<String>,
    pub confidence: f64,
    pub plate_url: Option<String>,
    pub scene_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: ViolationStatus,
}

impl NewViolation {
    /// The degenerate "image processed, nothing found" row.
    #[must_use]
    pub fn no_plate_detected(
        camera_id: impl Into<String>,
        scene_url: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            plate_text: None,
            confidence: 0.0,
            plate_url: None,
            scene_url,
            timestamp,
            status: ViolationStatus::NoPlateDetected,
        }
    }
}
