use crate::routes::{root, upload, webhook};
use crate::upload::interfaces::{PlateEntry, UploadRequest, UploadResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::root,
        root::handlers::test,
        root::handlers::health_check,
        // Upload handlers
        upload::handlers::upload_info,
        upload::handlers::upload_image,
        // Webhook handlers
        webhook::handlers::telegram_webhook,
    ),
    components(
        schemas(UploadRequest, UploadResponse, PlateEntry),
    ),
    tags(
        (name = "Upload", description = "Image ingestion and plate detection"),
        (name = "Webhook", description = "Messaging-gateway ingestion"),
        (name = "System", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;
