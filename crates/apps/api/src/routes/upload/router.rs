use crate::api_state::ApiContext;
use crate::upload::handlers::{upload_image, upload_info};
use axum::{Router, routing::get};

pub fn upload_router() -> Router<ApiContext> {
    Router::new().route("/upload", get(upload_info).post(upload_image))
}
