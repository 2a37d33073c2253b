//! Top-level pipeline orchestration.

use std::sync::Arc;

use boardlens_core::Photo;
use boardlens_llm::TextGenerator;
use boardlens_storage::PipelineStore;
use futures_util::future::join_all;

use crate::analysis::analyze_photo;
use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::summary::{FanoutReport, generate_class_summaries};

/// One upload batch handed to the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub class_id: i64,
    pub photos: Vec<Photo>,
}

/// Orchestration states, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Analyzing,
    Summarizing,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Final outcome of one pipeline invocation.
#[derive(Debug)]
pub struct PipelineReport {
    pub class_id: i64,
    /// Photos whose analysis completed.
    pub analyzed: usize,
    /// Photos whose analysis failed. Non-empty means the fanout never ran;
    /// explanations of the succeeded photos stay persisted regardless.
    pub failed_photos: Vec<i64>,
    /// Fanout outcomes, present only when every analysis succeeded.
    pub summaries: Option<FanoutReport>,
}

impl PipelineReport {
    /// Aggregate success: every analysis and all three summary fields.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed_photos.is_empty()
            && self.summaries.as_ref().is_some_and(FanoutReport::succeeded)
    }
}

/// The background content-generation pipeline for one class.
///
/// Holds the process-wide store handle and generator; invoked once per
/// upload batch. Not resumable across process restarts — whatever was
/// flushed stays readable, and a new invocation regenerates from scratch.
pub struct Pipeline {
    storage: Arc<dyn PipelineStore>,
    generator: Arc<dyn TextGenerator>,
    models: ModelConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        storage: Arc<dyn PipelineStore>,
        generator: Arc<dyn TextGenerator>,
        models: ModelConfig,
    ) -> Self {
        Self { storage, generator, models }
    }

    /// Run the full pipeline for one class: analyze every photo
    /// concurrently, then fan out the three summary generations.
    ///
    /// Analyses use an all-complete join: one photo failing never cancels
    /// its siblings, because their partial results are already durable. The
    /// fanout starts only if every analysis succeeded, and reads its input
    /// back from the store rather than trusting in-memory values.
    ///
    /// # Errors
    /// Returns an error only for storage faults between stages; per-photo
    /// and per-field failures are reported in the [`PipelineReport`].
    pub async fn run(&self, job: PipelineJob) -> Result<PipelineReport, PipelineError> {
        let class_id = job.class_id;
        self.enter(class_id, PipelineState::Pending);
        self.enter(class_id, PipelineState::Analyzing);

        let analyses = join_all(job.photos.iter().map(|photo| async move {
            let result = analyze_photo(
                self.generator.as_ref(),
                self.storage.as_ref(),
                photo,
                &self.models.vision,
            )
            .await;
            (photo.photo_id, result)
        }))
        .await;

        let mut analyzed = 0usize;
        let mut failed_photos = Vec::new();
        for (photo_id, result) in analyses {
            match result {
                Ok(_) => analyzed += 1,
                Err(e) => {
                    tracing::error!(class_id, photo_id, error = %e, "photo analysis failed");
                    failed_photos.push(photo_id);
                },
            }
        }

        if !failed_photos.is_empty() {
            self.enter(class_id, PipelineState::Failed);
            return Ok(PipelineReport { class_id, analyzed, failed_photos, summaries: None });
        }

        self.enter(class_id, PipelineState::Summarizing);

        // Re-read from the store so a digest is built from what readers can
        // actually see, in analysis-creation order.
        let explanations = self.storage.list_class_explanations(class_id).await?;
        let digest = explanations.join("\n\n");

        let fanout = generate_class_summaries(
            self.generator.as_ref(),
            self.storage.as_ref(),
            &self.models,
            class_id,
            &digest,
        )
        .await;

        if !fanout.succeeded() {
            tracing::warn!(
                class_id,
                failed_stages = ?fanout.failed_stages(),
                "class summary fanout partially failed"
            );
        }

        self.enter(class_id, PipelineState::Done);
        Ok(PipelineReport { class_id, analyzed, failed_photos, summaries: Some(fanout) })
    }

    fn enter(&self, class_id: i64, state: PipelineState) {
        tracing::info!(class_id, %state, "pipeline state");
    }
}
