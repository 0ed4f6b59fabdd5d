use chrono::{DateTime, Utc};

/// Identifier used when neither a camera id nor a chat id is available.
pub const FALLBACK_SOURCE_ID: &str = "UNKNOWN";

/// The logical origin of an image. `source_id` doubles as the storage-path
/// namespace for every artifact of the request, so it is sanitized on
/// construction and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub source_id: String,
    pub received_at: DateTime<Utc>,
}

impl SourceContext {
    #[must_use]
    pub fn from_camera(camera_id: &str, received_at: DateTime<Utc>) -> Self {
        Self {
            source_id: sanitize_source_id(camera_id),
            received_at,
        }
    }

    #[must_use]
    pub fn from_telegram_chat(chat_id: i64, received_at: DateTime<Utc>) -> Self {
        Self {
            source_id: format!("TELEGRAM_{chat_id}"),
            received_at,
        }
    }

    #[must_use]
    pub fn fallback(received_at: DateTime<Utc>) -> Self {
        Self {
            source_id: FALLBACK_SOURCE_ID.to_string(),
            received_at,
        }
    }
}

/// Replaces path-breaking characters so the id is safe as a key segment.
/// An id that sanitizes to nothing falls back to [`FALLBACK_SOURCE_ID`].
#[must_use]
pub fn sanitize_source_id(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // "." and ".." would escape the namespace segment.
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_SOURCE_ID.to_string()
    } else {
        cleaned
    }
}
