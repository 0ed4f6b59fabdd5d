use crate::api_state::ApiContext;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;

#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    responses(
        (status = 200, description = "Service banner")
    )
)]
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Plate detection server is running"
    }))
}

#[utoipa::path(
    get,
    path = "/test",
    tag = "System",
    responses(
        (status = 200, description = "Connectivity test")
    )
)]
pub async fn test() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Test successful" }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "API is healthy and ready to accept traffic", body = String),
        (status = 503, description = "API is not healthy, likely due to a database issue.")
    )
)]
pub async fn health_check(State(context): State<ApiContext>) -> Result<&'static str, StatusCode> {
    match sqlx::query("SELECT 1").fetch_one(&context.pool).await {
        Ok(_) => Ok("OK"),
        Err(e) => {
            error!("Health check failed: database connection error: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
