//! Typed error enum for the pipeline layer.
//!
//! Unifies generation and persistence failures so the orchestrator can
//! aggregate per-task outcomes without downcasting.

use boardlens_llm::LlmError;
use boardlens_storage::StorageError;
use thiserror::Error;

/// A single task's failure. Local to the photo or summary field that
/// produced it; siblings keep running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The generator call or its stream failed mid-way.
    #[error("generation: {0}")]
    Generation(#[from] LlmError),

    /// A durable write or read failed. Prior flushes for the key remain
    /// visible to readers.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Image bytes unreadable or a referenced row is missing.
    #[error("input: {0}")]
    Input(String),

    /// A spawned task was canceled or panicked before reporting.
    #[error("task canceled: {0}")]
    Canceled(String),
}
