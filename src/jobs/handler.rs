use crate::ai::EngineClient;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything a job needs at execution time.
#[derive(Clone)]
pub struct JobContext {
    pub pool: PgPool,
    pub engine: Arc<EngineClient>,
}

/// Trait for handling specific job kinds.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Execute the job. Returning an error schedules a retry until the job's
    /// attempt budget is exhausted.
    async fn run(&self, payload: Value, ctx: &JobContext) -> anyhow::Result<()>;

    /// The job kind this handler processes.
    fn kind(&self) -> &'static str;
}

/// Type-erased job handler factory.
pub type JobHandlerFactory =
    Box<dyn Fn(Value) -> anyhow::Result<Box<dyn JobHandler>> + Send + Sync>;
