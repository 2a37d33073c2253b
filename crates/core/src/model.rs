use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded classroom capture event ("class") grouping one or more photos.
///
/// The generation pipeline only ever writes the three text fields; identity
/// and creation date are owned by whoever created the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSession {
    pub class_id: i64,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
}

/// A captured whiteboard photograph. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub photo_id: i64,
    pub class_id: i64,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// Generated explanation for one photo, one row per photo.
///
/// `created_at` is set by the first flush and preserved by later upserts;
/// it is the ordering key when explanations are concatenated for the class
/// summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub photo_id: i64,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}
