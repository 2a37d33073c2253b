//! SQLite storage implementation

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use boardlens_core::{Analysis, ClassSession, Photo};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StorageError;
use crate::migrations;

/// Process-wide store handle. Opened once at startup and shared by every
/// pipeline task; cloning shares the underlying connection.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

fn lock_conn<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    mutex.lock().map_err(|e: PoisonError<_>| StorageError::LockPoisoned(e.to_string()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl Storage {
    /// Opens (creating if needed) the database at `db_path` and runs
    /// migrations.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn create_course(&self, name: &str) -> Result<i64, StorageError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO courses (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_class(&self, course_id: i64) -> Result<i64, StorageError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO classes (course_id, created_at) VALUES (?1, ?2)",
            params![course_id, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_class(&self, class_id: i64) -> Result<Option<ClassSession>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let row = conn
            .query_row(
                r"SELECT class_id, course_id, created_at, title, short_description, long_description
                  FROM classes WHERE class_id = ?1",
                params![class_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((class_id, course_id, created_at, title, short, long)) => {
                Ok(Some(ClassSession {
                    class_id,
                    course_id,
                    created_at: parse_timestamp(&created_at)?,
                    title,
                    short_description: short,
                    long_description: long,
                }))
            },
            None => Ok(None),
        }
    }

    fn update_class_field(
        &self,
        column: &'static str,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError> {
        let conn = lock_conn(&self.conn)?;
        let changed = conn.execute(
            &format!("UPDATE classes SET {column} = ?1 WHERE class_id = ?2"),
            params![text, class_id],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound { entity: "class", id: class_id });
        }
        Ok(())
    }

    pub fn set_class_title(&self, class_id: i64, text: &str) -> Result<(), StorageError> {
        self.update_class_field("title", class_id, text)
    }

    pub fn set_class_short_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError> {
        self.update_class_field("short_description", class_id, text)
    }

    pub fn set_class_long_description(
        &self,
        class_id: i64,
        text: &str,
    ) -> Result<(), StorageError> {
        self.update_class_field("long_description", class_id, text)
    }

    pub fn add_photo(&self, class_id: i64, file_path: &str) -> Result<i64, StorageError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            "INSERT INTO photos (class_id, file_path, created_at) VALUES (?1, ?2, ?3)",
            params![class_id, file_path, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let row = conn
            .query_row(
                "SELECT photo_id, class_id, file_path, created_at FROM photos WHERE photo_id = ?1",
                params![photo_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((photo_id, class_id, file_path, created_at)) => Ok(Some(Photo {
                photo_id,
                class_id,
                file_path,
                created_at: parse_timestamp(&created_at)?,
            })),
            None => Ok(None),
        }
    }

    pub fn list_class_photos(&self, class_id: i64) -> Result<Vec<Photo>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r"SELECT photo_id, class_id, file_path, created_at
              FROM photos WHERE class_id = ?1 ORDER BY photo_id ASC",
        )?;
        let rows = stmt.query_map(params![class_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut photos = Vec::new();
        for row in rows {
            let (photo_id, class_id, file_path, created_at) = row?;
            photos.push(Photo {
                photo_id,
                class_id,
                file_path,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(photos)
    }

    /// Insert-or-overwrite one photo's explanation.
    ///
    /// The row's `created_at` is set by the first flush and preserved by
    /// every later one; it records when generation for this photo first
    /// produced durable output and orders the class digest.
    pub fn upsert_explanation(&self, photo_id: i64, explanation: &str) -> Result<(), StorageError> {
        let conn = lock_conn(&self.conn)?;
        conn.execute(
            r"INSERT INTO analysis (photo_id, explanation, created_at)
              VALUES (?1, ?2, ?3)
              ON CONFLICT(photo_id) DO UPDATE SET explanation = excluded.explanation",
            params![photo_id, explanation, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_explanation(&self, photo_id: i64) -> Result<Option<String>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        Ok(conn
            .query_row(
                "SELECT explanation FROM analysis WHERE photo_id = ?1",
                params![photo_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn get_analysis(&self, photo_id: i64) -> Result<Option<Analysis>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let row = conn
            .query_row(
                "SELECT photo_id, explanation, created_at FROM analysis WHERE photo_id = ?1",
                params![photo_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((photo_id, explanation, created_at)) => Ok(Some(Analysis {
                photo_id,
                explanation,
                created_at: parse_timestamp(&created_at)?,
            })),
            None => Ok(None),
        }
    }

    /// All explanations for a class, ordered by when each analysis first
    /// reached the store. Photo id breaks ties from same-instant flushes.
    pub fn list_class_explanations(&self, class_id: i64) -> Result<Vec<String>, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(
            r"SELECT a.explanation
              FROM analysis a
              JOIN photos p ON p.photo_id = a.photo_id
              WHERE p.class_id = ?1
              ORDER BY a.created_at ASC, a.photo_id ASC",
        )?;
        let rows = stmt.query_map(params![class_id], |row| row.get::<_, String>(0))?;

        let mut explanations = Vec::new();
        for row in rows {
            explanations.push(row?);
        }
        Ok(explanations)
    }
}
