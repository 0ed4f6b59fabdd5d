use crate::database::ViolationSink;
use crate::pipeline::{ArtifactBuilder, ArtifactSet, annotated_key, plate_key, scene_file_name, scene_key};
use crate::storage::ArtifactStore;
use common_types::{
    DecodedImage, Detection, NewViolation, PlateReading, SourceContext, StorageArtifact,
    ViolationStatus,
};
use plate_vision::{PlateDetector, PlateReader};
use std::sync::Arc;
use tracing::{info, warn};

/// Stages a request moves through. Every stage past decoding degrades instead
/// of aborting, so a report always comes back in a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Detecting,
    Reading,
    Uploading,
    Recording,
    /// Every stage completed without loss.
    Done,
    /// Finished, but at least one non-fatal step was skipped or lossy.
    Degraded,
}

impl PipelineState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Detecting => "detecting",
            Self::Reading => "reading",
            Self::Uploading => "uploading",
            Self::Recording => "recording",
            Self::Done => "done",
            Self::Degraded => "degraded",
        }
    }
}

/// Everything produced for one detection: its region, the OCR reading, and
/// the stored crop.
#[derive(Debug, Clone)]
pub struct PlateOutcome {
    pub index: usize,
    pub detection: Detection,
    pub reading: PlateReading,
    pub plate: StorageArtifact,
}

/// Terminal summary of one processed image.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub source_id: String,
    pub file_name: String,
    pub scene: StorageArtifact,
    pub annotated: StorageArtifact,
    pub plates: Vec<PlateOutcome>,
    /// Violation rows actually written.
    pub recorded: usize,
}

impl PipelineReport {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.state == PipelineState::Degraded
    }
}

/// Runs a decoded image through detection, OCR, artifact upload, and
/// persistence. Each stage tolerates the failure of the previous one;
/// the only fatal error in the whole flow is an undecodable input, which
/// never reaches this type.
pub struct PlatePipeline {
    detector: Arc<dyn PlateDetector>,
    reader: Arc<dyn PlateReader>,
    storage: Arc<dyn ArtifactStore>,
    violations: Arc<dyn ViolationSink>,
    artifacts: ArtifactBuilder,
}

impl PlatePipeline {
    #[must_use]
    pub fn new(
        detector: Arc<dyn PlateDetector>,
        reader: Arc<dyn PlateReader>,
        storage: Arc<dyn ArtifactStore>,
        violations: Arc<dyn ViolationSink>,
        artifacts: ArtifactBuilder,
    ) -> Self {
        Self {
            detector,
            reader,
            storage,
            violations,
            artifacts,
        }
    }

    pub async fn process(&self, image: &DecodedImage, source: &SourceContext) -> PipelineReport {
        let mut degraded = false;
        stage(source, PipelineState::Received);

        stage(source, PipelineState::Detecting);
        let detections = match self.detector.detect(image.as_rgb()) {
            Ok(detections) => detections,
            Err(e) => {
                warn!(source_id = %source.source_id, "plate detection failed: {e:#}");
                degraded = true;
                Vec::new()
            }
        };

        stage(source, PipelineState::Reading);
        let readings = self.read_plates(image, &detections, source, &mut degraded);
        stage(source, PipelineState::Uploading);
        let artifacts = self.upload_artifacts(image, &detections, source, &mut degraded).await;
        stage(source, PipelineState::Recording);
        let recorded = self
            .record_violations(&detections, &readings, &artifacts, source, &mut degraded)
            .await;

        let plates = detections
            .into_iter()
            .zip(readings)
            .zip(artifacts.plates)
            .enumerate()
            .map(|(index, ((detection, reading), plate))| PlateOutcome {
                index,
                detection,
                reading,
                plate,
            })
            .collect::<Vec<_>>();

        let state = if degraded {
            PipelineState::Degraded
        } else {
            PipelineState::Done
        };
        info!(
            source_id = %source.source_id,
            plates = plates.len(),
            recorded,
            degraded,
            "image processed"
        );

        PipelineReport {
            state,
            source_id: source.source_id.clone(),
            file_name: scene_file_name(source.received_at),
            scene: artifacts.scene,
            annotated: artifacts.annotated,
            plates,
            recorded,
        }
    }

    fn read_plates(
        &self,
        image: &DecodedImage,
        detections: &[Detection],
        source: &SourceContext,
        degraded: &mut bool,
    ) -> Vec<PlateReading> {
        detections
            .iter()
            .enumerate()
            .map(|(index, detection)| {
                let crop = image.crop(&detection.bounding_box);
                match self.reader.read(&crop) {
                    Ok(reading) => reading,
                    Err(e) => {
                        warn!(source_id = %source.source_id, index, "plate OCR failed: {e:#}");
                        *degraded = true;
                        PlateReading::unreadable()
                    }
                }
            })
            .collect()
    }

    /// Uploads every artifact independently. Any failure yields an artifact
    /// without a public URL; the rest still go out.
    async fn upload_artifacts(
        &self,
        image: &DecodedImage,
        detections: &[Detection],
        source: &SourceContext,
        degraded: &mut bool,
    ) -> UploadedArtifacts {
        let set = match self.artifacts.build(image, detections, source) {
            Ok(set) => set,
            Err(e) => {
                warn!(source_id = %source.source_id, "artifact encoding failed: {e:#}");
                *degraded = true;
                return UploadedArtifacts::unuploaded(detections.len(), source);
            }
        };

        let ArtifactSet { scene, plates, annotated } = set;
        let scene = self.upload_one(scene.key, scene.bytes, degraded).await;
        let mut uploaded_plates = Vec::with_capacity(plates.len());
        for plate in plates {
            uploaded_plates.push(self.upload_one(plate.key, plate.bytes, degraded).await);
        }
        let annotated = self.upload_one(annotated.key, annotated.bytes, degraded).await;

        UploadedArtifacts {
            scene,
            plates: uploaded_plates,
            annotated,
        }
    }

    async fn upload_one(&self, key: String, bytes: Vec<u8>, degraded: &mut bool) -> StorageArtifact {
        match self.storage.put(&key, bytes).await {
            Ok(public_url) => StorageArtifact {
                key,
                public_url: Some(public_url),
            },
            Err(e) => {
                warn!(key, "artifact upload failed: {e:#}");
                *degraded = true;
                StorageArtifact::unuploaded(key)
            }
        }
    }

    /// One row per detection, or one degenerate row when nothing was found.
    /// Returns the number of rows that made it into the database.
    async fn record_violations(
        &self,
        detections: &[Detection],
        readings: &[PlateReading],
        artifacts: &UploadedArtifacts,
        source: &SourceContext,
        degraded: &mut bool,
    ) -> usize {
        let rows: Vec<NewViolation> = if detections.is_empty() {
            vec![NewViolation::no_plate_detected(
                source.source_id.clone(),
                artifacts.scene.public_url.clone(),
                source.received_at,
            )]
        } else {
            detections
                .iter()
                .zip(readings)
                .zip(&artifacts.plates)
                .map(|((detection, reading), plate)| NewViolation {
                    camera_id: source.source_id.clone(),
                    plate_text: Some(reading.text.clone()),
                    confidence: f64::from(detection.confidence),
                    plate_url: plate.public_url.clone(),
                    scene_url: artifacts.scene.public_url.clone(),
                    timestamp: source.received_at,
                    status: ViolationStatus::New,
                })
                .collect()
        };

        let mut recorded = 0;
        for row in &rows {
            match self.violations.insert(row).await {
                Ok(()) => recorded += 1,
                Err(e) => {
                    warn!(source_id = %source.source_id, "violation insert failed: {e:#}");
                    *degraded = true;
                }
            }
        }
        recorded
    }
}

fn stage(source: &SourceContext, state: PipelineState) {
    tracing::debug!(source_id = %source.source_id, stage = state.as_str(), "pipeline stage");
}

struct UploadedArtifacts {
    scene: StorageArtifact,
    plates: Vec<StorageArtifact>,
    annotated: StorageArtifact,
}

impl UploadedArtifacts {
    fn unuploaded(plate_count: usize, source: &SourceContext) -> Self {
        Self {
            scene: StorageArtifact::unuploaded(scene_key(source)),
            plates: (0..plate_count)
                .map(|index| StorageArtifact::unuploaded(plate_key(source, index)))
                .collect(),
            annotated: StorageArtifact::unuploaded(annotated_key(source)),
        }
    }
}
