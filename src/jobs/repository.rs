use crate::entities::{Job, JobStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Narrow enqueue-only seam so API handlers can queue work without owning the
/// whole repository (and so tests can mock it).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueueTrait {
    async fn enqueue(&self, kind: &str, payload: Value) -> Result<Uuid>;
}

#[derive(Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueueTrait for PgJobQueue {
    async fn enqueue(&self, kind: &str, payload: Value) -> Result<Uuid> {
        JobRepository::enqueue(&self.pool, kind, payload, None, None).await
    }
}

pub struct JobRepository;

impl JobRepository {
    /// Enqueue a new job.
    pub async fn enqueue(
        pool: &PgPool,
        kind: &str,
        payload: Value,
        run_at: Option<DateTime<Utc>>,
        max_attempts: Option<i32>,
    ) -> Result<Uuid> {
        let run_at = run_at.unwrap_or_else(Utc::now);
        let max_attempts = max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO jobs (kind, payload, run_at, max_attempts)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(kind)
        .bind(payload)
        .bind(run_at)
        .bind(max_attempts)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Fetch due jobs and reserve them for processing. A running job whose
    /// visibility window lapsed is considered abandoned and re-reservable.
    pub async fn fetch_due_jobs(
        pool: &PgPool,
        limit: i64,
        worker_id: Uuid,
        visibility_timeout_secs: i64,
    ) -> Result<Vec<Job>> {
        let visibility_till = Utc::now() + chrono::Duration::seconds(visibility_timeout_secs);

        let jobs = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'running'::job_status,
                visibility_till = $3,
                reserved_by = $2,
                updated_at = now()
            WHERE id IN (
                SELECT id
                FROM jobs
                WHERE (status = 'queued'::job_status OR
                      (status = 'running'::job_status AND visibility_till < now()))
                  AND run_at <= now()
                ORDER BY run_at
                FOR UPDATE SKIP LOCKED
                LIMIT $1
            )
            RETURNING *
            "#,
        )
        .bind(limit)
        .bind(worker_id)
        .bind(visibility_till)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    /// Mark job as succeeded.
    pub async fn mark_success(pool: &PgPool, job_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'succeeded'::job_status,
                visibility_till = NULL,
                reserved_by = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record a failed attempt: either schedule a retry at `next_run_at` or
    /// mark the job permanently failed.
    pub async fn mark_failure(
        pool: &PgPool,
        job_id: Uuid,
        error_message: &str,
        next_run_at: Option<DateTime<Utc>>,
        backoff_seconds: i32,
    ) -> Result<()> {
        let status = if next_run_at.is_some() {
            JobStatus::Queued
        } else {
            JobStatus::Failed
        };

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2,
                attempts = attempts + 1,
                last_error = $3,
                run_at = COALESCE($4, run_at),
                backoff_seconds = $5,
                visibility_till = NULL,
                reserved_by = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(status)
        .bind(error_message)
        .bind(next_run_at)
        .bind(backoff_seconds)
        .execute(pool)
        .await?;

        Ok(())
    }
}
