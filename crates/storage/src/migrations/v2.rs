//! Migration v2: Lookup indexes for per-class reads

pub(super) const SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_photos_class ON photos(class_id);
CREATE INDEX IF NOT EXISTS idx_classes_course ON classes(course_id);
CREATE INDEX IF NOT EXISTS idx_analysis_created ON analysis(created_at);
";
