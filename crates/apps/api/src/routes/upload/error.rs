use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_services::pipeline::ResolveError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No image data received")]
    NoImage,

    #[error("Invalid image data - could not decode")]
    InvalidImage,

    #[error("malformed multipart body")]
    Multipart(#[from] MultipartError),

    #[error("not a multipart request")]
    MultipartRejected(#[from] MultipartRejection),

    #[error("malformed JSON body")]
    InvalidJson,
}

impl From<ResolveError> for UploadError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::SourceUnavailable => Self::NoImage,
            ResolveError::Decode(_) => Self::InvalidImage,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Multipart(e) => format!("Malformed multipart body: {e}"),
            Self::MultipartRejected(e) => format!("Malformed multipart body: {e}"),
            other => other.to_string(),
        };
        let body = Json(json!({ "error": message }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
