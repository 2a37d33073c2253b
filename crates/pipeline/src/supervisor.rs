//! Background submission of pipeline runs.
//!
//! The upload path's responsibility ends at [`Supervisor::submit`]: the
//! supervisor owns the spawned task, bounds how many pipelines run at once,
//! and surfaces terminal outcomes to the logs. Callers that do want the
//! report can await the returned handle.

use std::sync::Arc;

use boardlens_core::env_parse_with_default;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::PipelineError;
use crate::orchestrator::{Pipeline, PipelineJob, PipelineReport};

const DEFAULT_PIPELINE_WORKERS: usize = 4;

pub struct Supervisor {
    semaphore: Arc<Semaphore>,
}

impl Supervisor {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_concurrent)) }
    }

    /// Concurrency limit from `BOARDLENS_PIPELINE_WORKERS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env_parse_with_default("BOARDLENS_PIPELINE_WORKERS", DEFAULT_PIPELINE_WORKERS))
    }

    /// Submit one pipeline run. Returns immediately; the run starts as soon
    /// as a worker permit is free.
    pub fn submit(
        &self,
        pipeline: Arc<Pipeline>,
        job: PipelineJob,
    ) -> JoinHandle<Result<PipelineReport, PipelineError>> {
        let semaphore = Arc::clone(&self.semaphore);
        let class_id = job.class_id;

        tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Canceled(e.to_string()))?;

            let result = pipeline.run(job).await;
            match &result {
                Ok(report) if report.succeeded() => {
                    tracing::info!(class_id, analyzed = report.analyzed, "pipeline succeeded");
                },
                Ok(report) => {
                    tracing::warn!(
                        class_id,
                        failed_photos = ?report.failed_photos,
                        failed_stages = ?report.summaries.as_ref().map(crate::FanoutReport::failed_stages),
                        "pipeline finished with failures"
                    );
                },
                Err(e) => {
                    tracing::error!(class_id, error = %e, "pipeline aborted");
                },
            }
            result
        })
    }
}
