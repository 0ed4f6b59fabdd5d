use app_state::AppSettings;
use axum::extract::FromRef;
use common_services::pipeline::{PlatePipeline, SourceResolver};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiContext {
    pub pool: PgPool,
    pub settings: AppSettings,
    pub resolver: Arc<SourceResolver>,
    pub pipeline: Arc<PlatePipeline>,
}

// These impls allow Axum to extract parts of the state directly, for
// handlers that only need one piece of it.
impl FromRef<ApiContext> for PgPool {
    fn from_ref(state: &ApiContext) -> Self {
        state.pool.clone()
    }
}

impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}
