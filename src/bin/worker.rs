use anyhow::Result;
use greenlight::{
    ai::EngineClient,
    config::Config,
    jobs::{AnalyzeListingHandler, JobContext, JobRegistry, Worker, WorkerConfig},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let engine = EngineClient::from_config(&config)?;

    let mut registry = JobRegistry::new();
    registry.register(AnalyzeListingHandler);

    let worker_config = WorkerConfig {
        concurrency: std::env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2),
        poll_interval_ms: std::env::var("WORKER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000),
        visibility_timeout_secs: std::env::var("WORKER_VISIBILITY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300),
        base_backoff_secs: std::env::var("WORKER_BASE_BACKOFF_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
    };

    let ctx = JobContext {
        pool,
        engine: Arc::new(engine),
    };
    let worker = Worker::new(ctx, registry, worker_config);
    worker.run().await
}
