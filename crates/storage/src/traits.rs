//! Async store traits.
//!
//! The pipeline only sees these traits; [`Storage`] implements them by
//! dispatching its sync methods through `spawn_blocking`.

use async_trait::async_trait;
use boardlens_core::{Analysis, ClassSession, Photo};

use crate::error::StorageError;
use crate::sqlite::Storage;

/// Class rows and their three generated text fields.
#[async_trait]
pub trait ClassStore: Send + Sync {
    /// Get a class by id.
    async fn get_class(&self, class_id: i64) -> Result<Option<ClassSession>, StorageError>;

    /// Overwrite the class title.
    async fn set_class_title(&self, class_id: i64, text: &str) -> Result<(), StorageError>;

    /// Overwrite the class short description.
    async fn set_class_short_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError>;

    /// Overwrite the class long description.
    async fn set_class_long_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError>;
}

/// Photo metadata reads.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Get a photo by id.
    async fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StorageError>;

    /// All photos of a class in upload order.
    async fn list_class_photos(&self, class_id: i64) -> Result<Vec<Photo>, StorageError>;
}

/// Streamed per-photo explanations. This is the partial-result sink: safe to
/// read at any time, returning whatever prefix has been committed so far.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Create-or-overwrite the explanation for one photo. Idempotent.
    async fn upsert_explanation(&self, photo_id: i64, text: &str) -> Result<(), StorageError>;

    /// Current (possibly partial) explanation for one photo.
    async fn get_explanation(&self, photo_id: i64) -> Result<Option<String>, StorageError>;

    /// Full analysis row for one photo.
    async fn get_analysis(&self, photo_id: i64) -> Result<Option<Analysis>, StorageError>;

    /// All of a class's explanations ordered by analysis creation time.
    async fn list_class_explanations(&self, class_id: i64) -> Result<Vec<String>, StorageError>;
}

/// Everything the generation pipeline needs from the store.
pub trait PipelineStore: ClassStore + PhotoStore + AnalysisStore {}

impl<T: ClassStore + PhotoStore + AnalysisStore> PipelineStore for T {}

#[async_trait]
impl ClassStore for Storage {
    async fn get_class(&self, class_id: i64) -> Result<Option<ClassSession>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.get_class(class_id)).await?
    }

    async fn set_class_title(&self, class_id: i64, text: &str) -> Result<(), StorageError> {
        let storage = self.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || storage.set_class_title(class_id, &text)).await?
    }

    async fn set_class_short_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError> {
        let storage = self.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || storage.set_class_short_description(class_id, &text))
            .await?
    }

    async fn set_class_long_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError> {
        let storage = self.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || storage.set_class_long_description(class_id, &text))
            .await?
    }
}

#[async_trait]
impl PhotoStore for Storage {
    async fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.get_photo(photo_id)).await?
    }

    async fn list_class_photos(&self, class_id: i64) -> Result<Vec<Photo>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.list_class_photos(class_id)).await?
    }
}

#[async_trait]
impl AnalysisStore for Storage {
    async fn upsert_explanation(&self, photo_id: i64, text: &str) -> Result<(), StorageError> {
        let storage = self.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || storage.upsert_explanation(photo_id, &text)).await?
    }

    async fn get_explanation(&self, photo_id: i64) -> Result<Option<String>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.get_explanation(photo_id)).await?
    }

    async fn get_analysis(&self, photo_id: i64) -> Result<Option<Analysis>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.get_analysis(photo_id)).await?
    }

    async fn list_class_explanations(&self, class_id: i64) -> Result<Vec<String>, StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.list_class_explanations(class_id)).await?
    }
}
