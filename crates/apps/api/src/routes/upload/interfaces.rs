use common_services::pipeline::PipelineReport;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body variant of the upload call. Either a gateway photo handle to
/// fetch remotely, or nothing image-related at all (the caller should then
/// use multipart or a raw body instead).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub telegram_file_id: Option<String>,
    pub camera_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlateEntry {
    /// File name of the stored crop, without its namespace segment.
    pub file: String,
    /// Normalized plate text, or the unreadable sentinel.
    pub text: String,
    pub plate_url: Option<String>,
    pub confidence: f32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub status: String,
    pub file: String,
    pub scene_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plates: Option<Vec<PlateEntry>>,
    pub message: String,
}

impl UploadResponse {
    #[must_use]
    pub fn from_report(report: &PipelineReport) -> Self {
        if report.plates.is_empty() {
            return Self {
                status: "no_plate_detected".to_string(),
                file: report.file_name.clone(),
                scene_url: report.scene.public_url.clone(),
                plates: None,
                message: "Image processed but no license plates found".to_string(),
            };
        }

        let plates: Vec<PlateEntry> = report
            .plates
            .iter()
            .map(|outcome| PlateEntry {
                file: file_name_of(&outcome.plate.key),
                text: outcome.reading.text.clone(),
                plate_url: outcome.plate.public_url.clone(),
                confidence: outcome.detection.confidence,
            })
            .collect();

        Self {
            status: "ok".to_string(),
            file: report.file_name.clone(),
            scene_url: report.scene.public_url.clone(),
            message: format!("Successfully detected {} plate(s)", plates.len()),
            plates: Some(plates),
        }
    }
}

/// Storage keys are `<namespace>/<file>`; clients only see the file part.
fn file_name_of(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_services::pipeline::{PipelineState, PlateOutcome};
    use common_types::{BoundingBox, Detection, PlateReading, StorageArtifact};

    fn report_with_plates(plates: Vec<PlateOutcome>) -> PipelineReport {
        PipelineReport {
            state: PipelineState::Done,
            source_id: "CAM1".to_string(),
            file_name: "20240305_143059.jpg".to_string(),
            scene: StorageArtifact {
                key: "CAM1/20240305_143059.jpg".to_string(),
                public_url: Some("https://cdn/scene.jpg".to_string()),
            },
            annotated: StorageArtifact::unuploaded("CAM1/20240305_143059_annotated.jpg"),
            recorded: plates.len().max(1),
            plates,
        }
    }

    fn outcome(index: usize, url: Option<&str>) -> PlateOutcome {
        PlateOutcome {
            index,
            detection: Detection {
                bounding_box: BoundingBox { x: 0, y: 0, width: 10, height: 5 },
                confidence: 0.89,
            },
            reading: PlateReading::readable("ABC1234", 0.9),
            plate: StorageArtifact {
                key: format!("CAM1/20240305_143059_plate_{index}.jpg"),
                public_url: url.map(String::from),
            },
        }
    }

    #[test]
    fn detections_produce_the_ok_shape() {
        let report = report_with_plates(vec![outcome(0, Some("https://cdn/p0.jpg"))]);
        let response = UploadResponse::from_report(&report);

        assert_eq!(response.status, "ok");
        assert_eq!(response.file, "20240305_143059.jpg");
        assert_eq!(response.message, "Successfully detected 1 plate(s)");
        let plates = response.plates.expect("plates present");
        assert_eq!(plates[0].file, "20240305_143059_plate_0.jpg");
        assert_eq!(plates[0].text, "ABC1234");
        assert_eq!(plates[0].plate_url.as_deref(), Some("https://cdn/p0.jpg"));
        assert!((plates[0].confidence - 0.89).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_detections_produce_the_no_plate_shape() {
        let report = report_with_plates(vec![]);
        let response = UploadResponse::from_report(&report);

        assert_eq!(response.status, "no_plate_detected");
        assert!(response.plates.is_none());
        assert_eq!(response.scene_url.as_deref(), Some("https://cdn/scene.jpg"));
        assert_eq!(
            response.message,
            "Image processed but no license plates found"
        );
    }

    #[test]
    fn failed_uploads_surface_as_null_urls() {
        let report = report_with_plates(vec![outcome(0, None)]);
        let response = UploadResponse::from_report(&report);
        assert_eq!(response.status, "ok");
        assert_eq!(response.plates.expect("plates")[0].plate_url, None);
    }
}
