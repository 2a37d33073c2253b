//! SQLite persistence layer for boardlens.
//!
//! [`Storage`] owns a single connection behind a mutex and exposes sync
//! methods; the async traits in [`traits`] dispatch through
//! `tokio::task::spawn_blocking` so pipeline tasks never block the runtime.
//! Every write is its own statement, so concurrent readers always observe
//! either the previous complete flush or a newer one, never a torn write.

mod error;
mod migrations;
mod sqlite;
pub mod traits;


pub use error::StorageError;
pub use sqlite::Storage;
pub use traits::{AnalysisStore, ClassStore, PhotoStore, PipelineStore};
