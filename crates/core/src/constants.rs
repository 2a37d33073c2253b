//! Shared constants for the streaming flush discipline.

/// Suffix appended to every non-final flush of a generated text field.
///
/// Readers polling mid-generation use its presence to decide whether to keep
/// polling. Must stay byte-identical to what existing stored data carries.
pub const SENTINEL_SUFFIX: &str = " ...";

/// Minimum milliseconds between two durable flushes of one streaming field.
pub const FLUSH_INTERVAL_MS: u64 = 1000;

/// Whether a stored text field is still under active generation.
#[must_use]
pub fn is_generating(text: &str) -> bool {
    text.ends_with(SENTINEL_SUFFIX)
}
