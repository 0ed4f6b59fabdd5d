use crate::{
    ApiSettings, DatabaseSettings, LoggingSettings, RawAnnotationSettings, RawDetectionSettings,
    RawOcrSettings, RawSettings, RawTelegramSettings, StorageSettings,
};
use std::path::{absolute, PathBuf};

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub telegram: TelegramSettings,
    pub detection: DetectionSettings,
    pub ocr: OcrSettings,
    pub annotation: AnnotationSettings,
}

/// Telegram ingestion is optional; an empty bot token disables it.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub model_path: PathBuf,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
}

#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    pub default_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct AnnotationSettings {
    pub font_path: Option<PathBuf>,
}

impl From<RawSettings> for AppSettings {
    fn from(raw: RawSettings) -> Self {
        let RawTelegramSettings { bot_token, api_base } = raw.telegram;
        let bot_token = Some(bot_token.trim().to_string()).filter(|t| !t.is_empty());

        let RawDetectionSettings {
            model_path,
            confidence_threshold,
            iou_threshold,
            input_size,
        } = raw.detection;
        let RawOcrSettings {
            detection_model_path,
            recognition_model_path,
            default_confidence,
        } = raw.ocr;
        let RawAnnotationSettings { font_path } = raw.annotation;

        Self {
            api: raw.api,
            logging: raw.logging,
            database: raw.database,
            storage: raw.storage,
            telegram: TelegramSettings { bot_token, api_base },
            detection: DetectionSettings {
                model_path: absolute(&model_path).expect("Invalid detection model_path"),
                confidence_threshold,
                iou_threshold,
                input_size,
            },
            ocr: OcrSettings {
                detection_model_path: absolute(&detection_model_path)
                    .expect("Invalid ocr detection_model_path"),
                recognition_model_path: absolute(&recognition_model_path)
                    .expect("Invalid ocr recognition_model_path"),
                default_confidence,
            },
            annotation: AnnotationSettings {
                font_path: font_path.map(|p| absolute(&p).expect("Invalid annotation font_path")),
            },
        }
    }
}
