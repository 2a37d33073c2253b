//! Prompt templates for the generation stages.

/// Fixed instruction for per-photo whiteboard analysis. The math-delimiter
/// rules keep the output renderable by the downstream formula renderer,
/// which only understands `$`/`$$` fences.
pub(crate) const ANALYSIS_PROMPT: &str = "\
# Task
- Analyze this university whiteboard photo in detail and explain the knowledge points it covers.

# Requirements
- Inline formulas must be wrapped in $ and block formulas in $$!
- Never wrap formulas in [] or ()!";

pub(crate) fn title_prompt(digest: &str) -> String {
    format!(
        "Generate a title for these class notes. Keep it concise: \
         output a single line of at most 10 characters.\nClass content: {digest}"
    )
}

pub(crate) fn short_description_prompt(digest: &str) -> String {
    format!(
        "# Task
Briefly summarize the knowledge points of this class from its whiteboard content.

# Requirements
- Do not output a heading

# Whiteboard content
{digest}"
    )
}

pub(crate) fn long_description_prompt(digest: &str) -> String {
    format!(
        "# Task
Work through the whiteboard content and enumerate the detailed knowledge points of this class.

# Requirements
- Do not output a heading

# Whiteboard content
{digest}"
    )
}
