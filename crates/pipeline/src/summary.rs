//! Class summary fanout: title, short description, long description.

use boardlens_llm::{ChatRequest, TextGenerator};
use boardlens_storage::ClassStore;

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::flush::drain_stream;
use crate::prompts;

/// Which class text field a summary stream writes to.
#[derive(Debug, Clone, Copy)]
enum SummaryField {
    Title,
    ShortDescription,
    LongDescription,
}

impl SummaryField {
    const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ShortDescription => "short_description",
            Self::LongDescription => "long_description",
        }
    }
}

/// Per-stage outcomes of one fanout. Aggregate success requires all three.
#[derive(Debug)]
pub struct FanoutReport {
    pub title: Result<String, PipelineError>,
    pub short_description: Result<String, PipelineError>,
    pub long_description: Result<String, PipelineError>,
}

impl FanoutReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.title.is_ok() && self.short_description.is_ok() && self.long_description.is_ok()
    }

    /// Names of the stages that failed, for the aggregate report.
    #[must_use]
    pub fn failed_stages(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.title.is_err() {
            failed.push(SummaryField::Title.name());
        }
        if self.short_description.is_err() {
            failed.push(SummaryField::ShortDescription.name());
        }
        if self.long_description.is_err() {
            failed.push(SummaryField::LongDescription.name());
        }
        failed
    }
}

/// Launch the three summary generations concurrently over the class digest
/// (the blank-line-joined explanations).
///
/// The legs are independent: a failed one never cancels the others, and each
/// flushes into its own class field under the shared flush discipline.
pub async fn generate_class_summaries(
    generator: &dyn TextGenerator,
    store: &dyn ClassStore,
    models: &ModelConfig,
    class_id: i64,
    digest: &str,
) -> FanoutReport {
    let (title, short_description, long_description) = tokio::join!(
        run_stage(
            generator,
            store,
            class_id,
            SummaryField::Title,
            ChatRequest::text(&models.title, prompts::title_prompt(digest)),
        ),
        run_stage(
            generator,
            store,
            class_id,
            SummaryField::ShortDescription,
            ChatRequest::text(&models.text, prompts::short_description_prompt(digest)),
        ),
        run_stage(
            generator,
            store,
            class_id,
            SummaryField::LongDescription,
            ChatRequest::text(&models.text, prompts::long_description_prompt(digest)),
        ),
    );

    FanoutReport { title, short_description, long_description }
}

async fn run_stage(
    generator: &dyn TextGenerator,
    store: &dyn ClassStore,
    class_id: i64,
    field: SummaryField,
    request: ChatRequest,
) -> Result<String, PipelineError> {
    tracing::info!(class_id, field = field.name(), "generating class summary field");

    let stream = generator.stream(request).await.inspect_err(
        |e| tracing::error!(class_id, field = field.name(), error = %e, "summary stream failed to open"),
    )?;

    let result = drain_stream(stream, |text| async move {
        match field {
            SummaryField::Title => store.set_class_title(class_id, &text).await,
            SummaryField::ShortDescription => {
                store.set_class_short_description(class_id, &text).await
            },
            SummaryField::LongDescription => {
                store.set_class_long_description(class_id, &text).await
            },
        }
    })
    .await;

    match &result {
        Ok(text) => {
            tracing::info!(class_id, field = field.name(), chars = text.len(), "summary field complete");
        },
        Err(e) => {
            tracing::error!(class_id, field = field.name(), error = %e, "summary field failed");
        },
    }
    result
}
