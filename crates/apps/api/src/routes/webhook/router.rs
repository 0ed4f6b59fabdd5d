use crate::api_state::ApiContext;
use crate::webhook::handlers::telegram_webhook;
use axum::{Router, routing::post};

pub fn webhook_router() -> Router<ApiContext> {
    Router::new().route("/telegram-webhook", post(telegram_webhook))
}
