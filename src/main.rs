use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use statuspipe::api;
use statuspipe::config::{self, PipelineConfig};
use statuspipe::extract::registry::default_registry;
use statuspipe::persist::InMemoryPersistence;
use statuspipe::pipeline::ReportPipeline;

const DEFAULT_ADDR: &str = "127.0.0.1:8090";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let pipeline = Arc::new(ReportPipeline::new(
        PipelineConfig::default(),
        default_registry(),
        Arc::new(InMemoryPersistence::new()),
    ));

    let addr = std::env::var("STATUSPIPE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        app = config::APP_NAME,
        version = config::APP_VERSION,
        addr = %addr,
        "listening"
    );
    axum::serve(listener, api::router(pipeline)).await?;
    Ok(())
}
