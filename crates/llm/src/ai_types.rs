use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub stream: bool,
}

impl ChatRequest {
    /// Text-only user request.
    #[must_use]
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message {
                role: "user".to_owned(),
                content: MessageContent::Text(prompt.into()),
            }],
            max_tokens: DEFAULT_MAX_TOKENS,
            stream: true,
        }
    }

    /// User request carrying an inline base64-encoded JPEG alongside the
    /// instruction text.
    #[must_use]
    pub fn with_image(
        model: impl Into<String>,
        prompt: impl Into<String>,
        base64_image: &str,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message {
                role: "user".to_owned(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: prompt.into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: format!("data:image/jpeg;base64,{base64_image}") },
                    },
                ]),
            }],
            max_tokens: DEFAULT_MAX_TOKENS,
            stream: true,
        }
    }
}

pub(crate) const DEFAULT_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

/// Plain string content, or the multi-part array form vision models accept.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct Delta {
    pub content: Option<String>,
}
