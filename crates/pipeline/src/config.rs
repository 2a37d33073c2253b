use boardlens_llm::{DEFAULT_TEXT_MODEL, DEFAULT_TITLE_MODEL, DEFAULT_VISION_MODEL};

/// Which model serves each generation stage.
///
/// Titles go to a cheaper model than the vision and description stages;
/// every knob has an env override.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Vision-capable model for per-photo analysis.
    pub vision: String,
    /// Model for the one-line class title.
    pub title: String,
    /// Model for the short and long class descriptions.
    pub text: String,
}

impl ModelConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            vision: env_or("BOARDLENS_VISION_MODEL", DEFAULT_VISION_MODEL),
            title: env_or("BOARDLENS_TITLE_MODEL", DEFAULT_TITLE_MODEL),
            text: env_or("BOARDLENS_TEXT_MODEL", DEFAULT_TEXT_MODEL),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vision: DEFAULT_VISION_MODEL.to_owned(),
            title: DEFAULT_TITLE_MODEL.to_owned(),
            text: DEFAULT_TEXT_MODEL.to_owned(),
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_owned())
}
