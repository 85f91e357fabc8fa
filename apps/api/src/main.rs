mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::UploadPipeline;
use crate::analysis::raster::PdftoppmRasterizer;
use crate::analysis::service::ClaudeAnalysisService;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileStore, RecordStore, RedisRecordStore, S3FileStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; a missing required variable aborts startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumind API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis record store
    let redis = redis::Client::open(config.redis_url.clone())?;
    let records: Arc<dyn RecordStore> = Arc::new(RedisRecordStore::new(redis));
    info!("Redis client initialized");

    // Initialize S3 / MinIO file store
    let s3 = build_s3_client(&config).await;
    let files: Arc<dyn FileStore> = Arc::new(S3FileStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM-backed analysis
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    let analysis = Arc::new(ClaudeAnalysisService::new(llm, files.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let rasterizer = Arc::new(PdftoppmRasterizer::new(
        config.pdftoppm_path.clone(),
        config.render_dpi,
    ));
    info!(
        "Rasterizer: {} at {} dpi",
        config.pdftoppm_path, config.render_dpi
    );

    let pipeline = UploadPipeline::new(files.clone(), records.clone(), rasterizer, analysis);

    // Build app state
    let state = AppState {
        files,
        records,
        pipeline: Arc::new(pipeline),
    };

    // Build router
    let app = build_router(state, config.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumind-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
