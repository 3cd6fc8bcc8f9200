use crate::jobs::{JobContext, JobRegistry, JobRepository, retry_delay};
use anyhow::Result;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{
    signal,
    sync::Semaphore,
    time::{interval, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Worker configuration.
#[derive(Clone)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub poll_interval_ms: u64,
    pub visibility_timeout_secs: i64,
    pub base_backoff_secs: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval_ms: 1000,
            visibility_timeout_secs: 300, // analysis calls can run for minutes
            base_backoff_secs: 60,
        }
    }
}

/// Reserves due jobs from the queue and dispatches them to registered
/// handlers, bounded by a concurrency semaphore, until shut down.
pub struct Worker {
    ctx: JobContext,
    registry: Arc<JobRegistry>,
    config: WorkerConfig,
    worker_id: Uuid,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(ctx: JobContext, registry: JobRegistry, config: WorkerConfig) -> Self {
        Self {
            ctx,
            registry: Arc::new(registry),
            config,
            worker_id: Uuid::new_v4(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the dispatch loop when cancelled. Exposed so tests
    /// and embedding binaries can shut the worker down programmatically.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) -> Result<()> {
        info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_ms = self.config.poll_interval_ms,
            "worker starting"
        );

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown.cancel();
        });

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let free = semaphore.available_permits();
            if free == 0 {
                continue;
            }

            let due = match JobRepository::fetch_due_jobs(
                &self.ctx.pool,
                free as i64,
                self.worker_id,
                self.config.visibility_timeout_secs,
            )
            .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!("Failed to fetch jobs: {}", e);
                    // Brief pause on error to avoid a tight loop
                    sleep(Duration::from_millis(1000)).await;
                    continue;
                }
            };

            if !due.is_empty() {
                debug!("Reserved {} due jobs", due.len());
            }

            for job in due {
                let permit = semaphore.clone().acquire_owned().await?;
                let ctx = self.ctx.clone();
                let registry = self.registry.clone();
                let config = self.config.clone();
                let span =
                    info_span!("job", id = %job.id, kind = %job.kind, attempt = job.attempts);

                tokio::spawn(
                    async move {
                        let _permit = permit; // held until the job completes
                        execute_job(ctx, registry, config, job).await;
                    }
                    .instrument(span),
                );
            }
        }

        info!("Dispatch stopped, waiting for in-flight jobs...");
        let _permits = semaphore
            .acquire_many(self.config.concurrency as u32)
            .await?;
        info!("All jobs completed, worker shut down");

        Ok(())
    }
}

async fn execute_job(
    ctx: JobContext,
    registry: Arc<JobRegistry>,
    config: WorkerConfig,
    job: crate::entities::Job,
) {
    info!("Processing job {} (attempt {})", job.id, job.attempts + 1);

    let handler = match registry.create_handler(&job.kind, job.payload.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            error!("No handler for job {}: {}", job.id, e);
            let _ = JobRepository::mark_failure(
                &ctx.pool,
                job.id,
                &format!("Failed to create handler: {}", e),
                None,
                0,
            )
            .await;
            return;
        }
    };

    match handler.run(job.payload.clone(), &ctx).await {
        Ok(()) => {
            info!("Job {} completed successfully", job.id);
            if let Err(e) = JobRepository::mark_success(&ctx.pool, job.id).await {
                error!("Failed to mark job {} as successful: {}", job.id, e);
            }
        }
        Err(e) => {
            let attempt = job.attempts + 1;
            warn!("Job {} failed (attempt {}): {}", job.id, attempt, e);

            if attempt < job.max_attempts {
                let delay = retry_delay(attempt, config.base_backoff_secs);
                let next_run_at = Utc::now()
                    + chrono::Duration::seconds(delay.as_secs() as i64);

                info!(
                    "Job {} will retry in {}s (attempt {}/{})",
                    job.id,
                    delay.as_secs(),
                    attempt + 1,
                    job.max_attempts
                );

                if let Err(retry_err) = JobRepository::mark_failure(
                    &ctx.pool,
                    job.id,
                    &e.to_string(),
                    Some(next_run_at),
                    delay.as_secs() as i32,
                )
                .await
                {
                    error!("Failed to schedule retry for job {}: {}", job.id, retry_err);
                }
            } else {
                warn!(
                    "Job {} permanently failed after {} attempts",
                    job.id, attempt
                );
                if let Err(fail_err) =
                    JobRepository::mark_failure(&ctx.pool, job.id, &e.to_string(), None, 0).await
                {
                    error!(
                        "Failed to mark job {} as permanently failed: {}",
                        job.id, fail_err
                    );
                }
            }
        }
    }
}
