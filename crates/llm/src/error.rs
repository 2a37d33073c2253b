//! Typed error enum for the LLM crate.

use thiserror::Error;

/// Errors from LLM API operations.
///
/// Stream failures are not retried here: a failed stream fails the whole
/// generation and the caller decides what to do with whatever was already
/// flushed downstream.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response: no choices returned")]
    EmptyResponse,
    #[error("stream closed before completion signal")]
    StreamClosed,
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl LlmError {
    /// Whether this error is transient. Nothing in this crate retries on it;
    /// the distinction exists for callers and for log triage.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) | Self::StreamClosed => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            _ => false,
        }
    }
}
