use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::ai_types::ChatRequest;
use crate::client::LlmClient;
use crate::error::LlmError;

/// A lazy sequence of content deltas ending at the provider's completion
/// signal. An `Err` item is terminal.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Seam over the streaming model invocation so the pipeline can run against
/// a scripted generator in tests. Instances must be safely shareable across
/// many concurrent streams.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Open one streaming generation. Each call produces a fresh stream;
    /// a stream is not restartable mid-way.
    async fn stream(&self, request: ChatRequest) -> Result<TextStream, LlmError>;
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn stream(&self, request: ChatRequest) -> Result<TextStream, LlmError> {
        self.stream_chat(&request).await
    }
}
