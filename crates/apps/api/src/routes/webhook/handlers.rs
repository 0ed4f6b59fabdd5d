use crate::api_state::ApiContext;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use common_services::pipeline::ImageRequest;
use common_services::telegram::TelegramUpdate;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Gateway webhook sink. Always answers success, whatever happens inside:
/// any non-200 response makes the gateway redeliver the update and
/// double-process the image. Failures are surfaced through logs only.
#[utoipa::path(
    post,
    path = "/telegram-webhook",
    tag = "Webhook",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Update accepted. Always returned, regardless of internal outcome.")
    )
)]
pub async fn telegram_webhook(State(context): State<ApiContext>, body: Bytes) -> Json<Value> {
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("discarding unparseable webhook payload: {e}");
            return acknowledged();
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "update without a message");
        return acknowledged();
    };
    let Some(photo) = message.largest_photo() else {
        debug!(chat_id = message.chat.id, "update without a photo");
        return acknowledged();
    };

    let request = ImageRequest {
        telegram_file_id: Some(photo.file_id.clone()),
        chat_id: Some(message.chat.id),
        ..Default::default()
    };
    match context.resolver.resolve(&request).await {
        Ok((image, source)) => {
            let report = context.pipeline.process(&image, &source).await;
            debug!(
                source_id = %report.source_id,
                plates = report.plates.len(),
                "webhook image processed"
            );
        }
        Err(e) => warn!(chat_id = message.chat.id, "webhook image unusable: {e}"),
    }

    acknowledged()
}

fn acknowledged() -> Json<Value> {
    Json(json!({ "ok": true }))
}
