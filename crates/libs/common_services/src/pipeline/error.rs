use common_types::DecodeError;
use thiserror::Error;

/// Fatal resolver outcomes. Everything past a successful decode is handled
/// as degradation inside the orchestrator instead of surfacing here.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No strategy in the chain produced image bytes.
    #[error("no image data received")]
    SourceUnavailable,

    /// Bytes were found but are not a decodable image.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
