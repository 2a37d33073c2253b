use futures_util::StreamExt;

use crate::ai_types::ChatRequest;
use crate::error::LlmError;
use crate::generator::TextStream;
use crate::sse::{SseLineBuffer, parse_data_payload};

/// Default model for whiteboard image analysis (vision-capable).
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-2024-11-20";
/// Default model for class titles (cheap, short output).
pub const DEFAULT_TITLE_MODEL: &str = "doubao-pro-256k-241115";
/// Default model for the short/long class descriptions.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-2024-11-20";

/// Vision streams can run for minutes; the request timeout covers the whole
/// streamed body, not just the first byte.
const REQUEST_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Client for streaming chat-completion calls.
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Creates a new client with the given API key and base URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// failure).
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self { client, api_key, base_url })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a streaming chat completion and return the content deltas.
    ///
    /// The stream ends after the provider's completion signal
    /// (`finish_reason` or `data: [DONE]`). A transport drop before that
    /// signal surfaces as a final [`LlmError::StreamClosed`] item. Errors
    /// are terminal; nothing here retries.
    ///
    /// # Errors
    /// Returns an error if the request cannot be sent or the API answers
    /// with a non-success status.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<TextStream, LlmError> {
        tracing::debug!(model = %request.model, "opening chat completion stream");
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            return Err(LlmError::HttpStatus { code: status.as_u16(), body });
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::try_stream! {
            let mut lines = SseLineBuffer::new();
            let mut finished = false;

            'outer: while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(LlmError::HttpRequest)?;
                for payload in lines.push(&chunk) {
                    let parsed = parse_data_payload(&payload)?;
                    if let Some(delta) = parsed.delta {
                        yield delta;
                    }
                    if parsed.finished {
                        finished = true;
                        break 'outer;
                    }
                }
            }

            if !finished {
                Err(LlmError::StreamClosed)?;
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
