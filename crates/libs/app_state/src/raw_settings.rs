use serde::Deserialize;
use std::path::PathBuf;

/// Settings exactly as they appear in `config/settings.yaml`, before path
/// normalization. Deployments override individual values through
/// `APP__`-prefixed environment variables (e.g. `APP__DATABASE__URL`).
#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub telegram: RawTelegramSettings,
    pub detection: RawDetectionSettings,
    pub ocr: RawOcrSettings,
    pub annotation: RawAnnotationSettings,
}

/// Configuration for the API server.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    /// Hard cap on inbound request bodies, in bytes.
    pub max_body_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Database connection and pool tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
    pub acquire_timeout: u64,
}

/// Supabase-compatible object storage endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawTelegramSettings {
    pub bot_token: String,
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawDetectionSettings {
    pub model_path: PathBuf,
    /// Detections scoring below this never leave the detector adapter.
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawOcrSettings {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    /// The OCR engine does not report per-line certainty; readable text gets
    /// this fixed confidence.
    pub default_confidence: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawAnnotationSettings {
    pub font_path: Option<PathBuf>,
}
