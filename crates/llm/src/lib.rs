//! Streaming LLM client.
//!
//! Wraps an OpenAI-style `/v1/chat/completions` endpoint with `stream: true`
//! and exposes the response as a stream of content deltas. Prompts may carry
//! inline base64 image data for vision models. The client opens the network
//! stream and nothing else; persistence of accumulated text is the caller's
//! concern.

mod ai_types;
mod client;
mod error;
mod generator;
mod sse;


pub use ai_types::{ChatRequest, ContentPart, ImageUrl, Message, MessageContent};
pub use client::{DEFAULT_TEXT_MODEL, DEFAULT_TITLE_MODEL, DEFAULT_VISION_MODEL, LlmClient};
pub use error::LlmError;
pub use generator::{TextGenerator, TextStream};
