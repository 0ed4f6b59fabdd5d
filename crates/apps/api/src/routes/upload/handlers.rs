use crate::api_state::ApiContext;
use crate::upload::error::UploadError;
use crate::upload::interfaces::{UploadRequest, UploadResponse};
use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use common_services::pipeline::ImageRequest;
use serde_json::{Value, json};
use tracing::info;

const DEFAULT_CAMERA_ID: &str = "CAM1";

#[utoipa::path(
    get,
    path = "/upload",
    tag = "Upload",
    responses(
        (status = 200, description = "Usage information for the upload endpoint")
    )
)]
pub async fn upload_info() -> Json<Value> {
    Json(json!({
        "endpoint": "/upload",
        "method": "POST",
        "status": "ready",
        "message": "This endpoint accepts POST requests with image data",
        "expected_fields": {
            "image": "multipart/form-data file (required)",
            "camera_id": "string (optional, defaults to CAM1)"
        },
        "example": "curl -X POST https://your-domain/upload -F 'camera_id=CAM1' -F 'image=@photo.jpg'"
    }))
}

/// Accepts an image as multipart form data, a JSON body carrying a gateway
/// photo handle, or raw bytes, and runs it through the plate pipeline.
///
/// # Errors
///
/// Returns an `UploadError` when no image data is present or the bytes are
/// not a decodable image. Everything past decoding degrades instead of
/// failing, so a `200` response can still carry null URLs.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Upload",
    request_body(content = UploadRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Image processed.", body = UploadResponse),
        (status = 400, description = "No image data received, or the bytes could not be decoded."),
    )
)]
pub async fn upload_image(
    State(context): State<ApiContext>,
    request: Request,
) -> Result<Json<UploadResponse>, UploadError> {
    let header_camera = request
        .headers()
        .get("X-Camera-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body_limit = context.settings.api.max_body_bytes;

    let mut image_request = if content_type.starts_with("multipart/form-data") {
        read_multipart(Multipart::from_request(request, &()).await?).await?
    } else if content_type.starts_with("application/json") {
        let bytes = axum::body::to_bytes(request.into_body(), body_limit)
            .await
            .map_err(|_| UploadError::NoImage)?;
        let body: UploadRequest =
            serde_json::from_slice(&bytes).map_err(|_| UploadError::InvalidJson)?;
        ImageRequest {
            telegram_file_id: body.telegram_file_id,
            camera_id: body.camera_id,
            ..Default::default()
        }
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), body_limit)
            .await
            .map_err(|_| UploadError::NoImage)?;
        ImageRequest {
            raw_body: Some(bytes.to_vec()),
            ..Default::default()
        }
    };

    if image_request.camera_id.as_deref().is_none_or(str::is_empty) {
        image_request.camera_id = header_camera.or_else(|| Some(DEFAULT_CAMERA_ID.to_string()));
    }

    let (image, source) = context.resolver.resolve(&image_request).await?;
    info!(source_id = %source.source_id, "processing uploaded image");
    let report = context.pipeline.process(&image, &source).await;
    Ok(Json(UploadResponse::from_report(&report)))
}

async fn read_multipart(mut multipart: Multipart) -> Result<ImageRequest, UploadError> {
    let mut request = ImageRequest::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => request.image_field = Some(field.bytes().await?.to_vec()),
            Some("file") => request.file_field = Some(field.bytes().await?.to_vec()),
            Some("camera_id") => {
                request.camera_id = field.text().await.ok().filter(|t| !t.is_empty());
            }
            Some("telegram_file_id") => {
                request.telegram_file_id = field.text().await.ok().filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }
    Ok(request)
}
