//! Per-photo analysis task.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use boardlens_core::Photo;
use boardlens_llm::{ChatRequest, TextGenerator};
use boardlens_storage::AnalysisStore;

use crate::error::PipelineError;
use crate::flush::drain_stream;
use crate::prompts::ANALYSIS_PROMPT;

/// Run one photo through the vision model, streaming the explanation into
/// the analysis sink keyed by photo id.
///
/// Returns the final accumulated explanation. Unreadable image bytes or a
/// failed stream fail this photo only; whatever was flushed before the
/// failure stays readable under the sentinel suffix.
pub async fn analyze_photo(
    generator: &dyn TextGenerator,
    store: &dyn AnalysisStore,
    photo: &Photo,
    model: &str,
) -> Result<String, PipelineError> {
    tracing::info!(photo_id = photo.photo_id, path = %photo.file_path, "analyzing photo");

    let bytes = tokio::fs::read(&photo.file_path).await.map_err(|e| {
        PipelineError::Input(format!("cannot read photo {}: {e}", photo.file_path))
    })?;
    let encoded = BASE64.encode(&bytes);

    let request = ChatRequest::with_image(model, ANALYSIS_PROMPT, &encoded);
    let stream = generator.stream(request).await?;

    let photo_id = photo.photo_id;
    let explanation = drain_stream(stream, |text| async move {
        store.upsert_explanation(photo_id, &text).await
    })
    .await?;

    tracing::info!(photo_id, chars = explanation.len(), "photo analysis complete");
    Ok(explanation)
}
