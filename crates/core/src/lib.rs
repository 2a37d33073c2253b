//! Core domain types and constants shared across the boardlens workspace.

mod constants;
mod env_config;
mod model;

pub use constants::{FLUSH_INTERVAL_MS, SENTINEL_SUFFIX, is_generating};
pub use env_config::env_parse_with_default;
pub use model::{Analysis, ClassSession, Photo};
