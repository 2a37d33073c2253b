//! The content-generation pipeline.
//!
//! Triggered once per completed upload batch: every photo of a class is
//! analyzed by a vision model concurrently, each stream flushing partial
//! explanations into the store; once all analyses finish, three summary
//! generations (title, short description, long description) fan out in
//! parallel over the concatenated explanations. Readers poll the store
//! independently at any time; a trailing sentinel marks text still being
//! generated.
//!
//! Failures stay local to the task that produced them. Nothing here retries,
//! and nothing ever deletes a partial result that already reached the store.

mod analysis;
mod config;
mod error;
mod flush;
mod orchestrator;
mod prompts;
mod summary;
mod supervisor;

#[cfg(test)]
mod tests;

pub use analysis::analyze_photo;
pub use config::ModelConfig;
pub use error::PipelineError;
pub use flush::drain_stream;
pub use orchestrator::{Pipeline, PipelineJob, PipelineReport, PipelineState};
pub use summary::{FanoutReport, generate_class_summaries};
pub use supervisor::Supervisor;
