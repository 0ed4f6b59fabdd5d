use crate::api_state::ApiContext;
use crate::create_router;
use app_state::AppSettings;
use axum::extract::DefaultBodyLimit;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::database::ViolationStore;
use common_services::pipeline::{ArtifactBuilder, PlatePipeline, SourceResolver};
use common_services::storage::SupabaseStorage;
use common_services::telegram::{PhotoFetcher, TelegramClient};
use plate_vision::{OcrsPlateReader, RtenPlateDetector};
use reqwest::Client;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn serve(pool: PgPool, settings: AppSettings) -> Result<()> {
    info!("🚀 Initializing server...");
    let http_client = Client::new();

    // Models are loaded once and shared read-only across all requests.
    let detector = RtenPlateDetector::from_settings(&settings.detection)?;
    let reader = OcrsPlateReader::from_settings(&settings.ocr)?;
    let storage = SupabaseStorage::new(http_client.clone(), &settings.storage);
    let violations = ViolationStore::new(pool.clone());

    let telegram = TelegramClient::from_settings(http_client, &settings.telegram);
    if telegram.is_none() {
        info!("No bot token configured, webhook ingestion is disabled.");
    }
    let fetcher = telegram.map(|client| Arc::new(client) as Arc<dyn PhotoFetcher>);

    let api_state = ApiContext {
        pool,
        settings: settings.clone(),
        resolver: Arc::new(SourceResolver::new(fetcher)),
        pipeline: Arc::new(PlatePipeline::new(
            Arc::new(detector),
            Arc::new(reader),
            Arc::new(storage),
            Arc::new(violations),
            ArtifactBuilder::from_settings(&settings.annotation),
        )),
    };

    let app = create_router(api_state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(settings.api.max_body_bytes));

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port)
        .parse()
        .map_err(|e| eyre!("Invalid address: {e}"))?;

    info!("🐸 Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
