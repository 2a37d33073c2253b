//! Minimal server-sent-events framing for chat-completion streams.
//!
//! The endpoint emits `data: {json}` lines and terminates the stream with
//! `data: [DONE]`. Network chunks split lines arbitrarily, so payloads are
//! reassembled from a rolling buffer.

use crate::ai_types::StreamChunk;
use crate::error::LlmError;

/// Reassembles `data:` payloads from arbitrarily-split network chunks.
///
/// Accumulates raw bytes and decodes only complete lines, since a chunk
/// boundary can land inside a multi-byte UTF-8 character.
pub(crate) struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one network chunk; returns every complete `data:` payload it
    /// finished. Non-data lines (comments, blank keep-alives) are dropped.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(payload) = line.strip_prefix("data:") {
                let payload = payload.trim_start();
                if !payload.is_empty() {
                    payloads.push(payload.to_owned());
                }
            }
        }
        payloads
    }
}

/// One decoded streaming chunk: an optional content delta plus whether the
/// provider signaled completion.
#[derive(Debug)]
pub(crate) struct ParsedDelta {
    pub delta: Option<String>,
    pub finished: bool,
}

/// Decode one `data:` payload. `[DONE]` is the transport-level terminator.
pub(crate) fn parse_data_payload(payload: &str) -> Result<ParsedDelta, LlmError> {
    if payload == "[DONE]" {
        return Ok(ParsedDelta { delta: None, finished: true });
    }

    let chunk: StreamChunk =
        serde_json::from_str(payload).map_err(|e| LlmError::JsonParse {
            context: format!("stream chunk (payload: {})", crate::client::truncate(payload, 200)),
            source: e,
        })?;

    let Some(choice) = chunk.choices.first() else {
        // Keep-alive chunks without choices occur on some providers.
        return Ok(ParsedDelta { delta: None, finished: false });
    };

    Ok(ParsedDelta {
        delta: choice.delta.content.clone().filter(|c| !c.is_empty()),
        finished: choice.finish_reason.is_some(),
    })
}
