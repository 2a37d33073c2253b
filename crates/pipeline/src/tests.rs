use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use boardlens_core::{Photo, is_generating};
use boardlens_llm::{ChatRequest, LlmError, TextGenerator, TextStream};
use boardlens_storage::{ClassStore, Storage, StorageError};
use tempfile::TempDir;

use crate::{
    FanoutReport, ModelConfig, Pipeline, PipelineJob, Supervisor, generate_class_summaries,
};

/// Replays the same chunk script for every stream it opens, recording each
/// request. Optionally fails (before producing any delta) every request
/// whose JSON body contains a needle.
struct ScriptedGenerator {
    chunks: Vec<&'static str>,
    delay_ms: u64,
    fail_if_contains: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGenerator {
    fn new(chunks: Vec<&'static str>) -> Self {
        Self { chunks, delay_ms: 0, fail_if_contains: None, requests: Mutex::new(Vec::new()) }
    }

    fn failing_for(chunks: Vec<&'static str>, needle: &str) -> Self {
        Self {
            chunks,
            delay_ms: 0,
            fail_if_contains: Some(needle.to_owned()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn slow(chunks: Vec<&'static str>, delay_ms: u64) -> Self {
        Self { chunks, delay_ms, fail_if_contains: None, requests: Mutex::new(Vec::new()) }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request_bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn stream(&self, request: ChatRequest) -> Result<TextStream, LlmError> {
        let body = serde_json::to_string(&request).unwrap();
        self.requests.lock().unwrap().push(request);

        if self.fail_if_contains.as_ref().is_some_and(|needle| body.contains(needle)) {
            return Ok(Box::pin(futures_util::stream::iter(vec![Err(LlmError::StreamClosed)])));
        }

        let chunks = self.chunks.clone();
        let delay_ms = self.delay_ms;
        Ok(Box::pin(async_stream::stream! {
            for (i, chunk) in chunks.into_iter().enumerate() {
                if i > 0 && delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                yield Ok(chunk.to_owned());
            }
        }))
    }
}

/// ClassStore sink that records every write per field.
#[derive(Default)]
struct RecordingClassSink {
    titles: Mutex<Vec<String>>,
}

#[async_trait]
impl ClassStore for RecordingClassSink {
    async fn get_class(
        &self,
        _class_id: i64,
    ) -> Result<Option<boardlens_core::ClassSession>, StorageError> {
        Ok(None)
    }

    async fn set_class_title(&self, _class_id: i64, text: &str) -> Result<(), StorageError> {
        self.titles.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    async fn set_class_short_description(
        &self,
        _class_id: i64,
        _text: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    async fn set_class_long_description(
        &self,
        _class_id: i64,
        _text: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

struct Fixture {
    _temp_dir: TempDir,
    storage: Storage,
    class_id: i64,
    photos: Vec<Photo>,
}

/// Creates a class with `contents.len()` photos whose files hold the given
/// bytes.
fn setup_class(contents: &[&str]) -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(&temp_dir.path().join("test.db")).unwrap();
    let course_id = storage.create_course("Calculus").unwrap();
    let class_id = storage.create_class(course_id).unwrap();

    for (i, content) in contents.iter().enumerate() {
        let path = temp_dir.path().join(format!("board_{i}.jpg"));
        std::fs::write(&path, content).unwrap();
        storage.add_photo(class_id, path.to_str().unwrap()).unwrap();
    }

    let photos = storage.list_class_photos(class_id).unwrap();
    Fixture { _temp_dir: temp_dir, storage, class_id, photos }
}

fn make_pipeline(fixture: &Fixture, generator: Arc<ScriptedGenerator>) -> Pipeline {
    Pipeline::new(Arc::new(fixture.storage.clone()), generator, ModelConfig::default())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_pipeline_success() {
    let fixture = setup_class(&["A", "B"]);
    let generator = Arc::new(ScriptedGenerator::new(vec!["x1", "x2"]));
    let pipeline = make_pipeline(&fixture, Arc::clone(&generator));

    let job = PipelineJob { class_id: fixture.class_id, photos: fixture.photos.clone() };
    let report = pipeline.run(job).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.analyzed, 2);
    assert!(report.failed_photos.is_empty());

    for photo in &fixture.photos {
        let explanation = fixture.storage.get_explanation(photo.photo_id).unwrap().unwrap();
        assert_eq!(explanation, "x1x2");
        assert!(!is_generating(&explanation));
    }

    let class = fixture.storage.get_class(fixture.class_id).unwrap().unwrap();
    assert_eq!(class.title.as_deref(), Some("x1x2"));
    assert_eq!(class.short_description.as_deref(), Some("x1x2"));
    assert_eq!(class.long_description.as_deref(), Some("x1x2"));

    // 2 analysis requests + 3 summary requests.
    assert_eq!(generator.request_count(), 5);
    let summary_bodies: Vec<String> = generator
        .request_bodies()
        .into_iter()
        .filter(|b| b.contains("x1x2\\n\\nx1x2"))
        .collect();
    assert_eq!(summary_bodies.len(), 3, "each summary leg gets the joined digest");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_photo_skips_fanout_keeps_sibling_explanation() {
    let fixture = setup_class(&["A", "B"]);
    // "A" encodes to QQ==, so only that photo's stream fails, before any delta.
    let generator = Arc::new(ScriptedGenerator::failing_for(vec!["x1", "x2"], "QQ=="));
    let pipeline = make_pipeline(&fixture, Arc::clone(&generator));

    let job = PipelineJob { class_id: fixture.class_id, photos: fixture.photos.clone() };
    let report = pipeline.run(job).await.unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.analyzed, 1);
    assert_eq!(report.failed_photos, vec![fixture.photos[0].photo_id]);
    assert!(report.summaries.is_none());

    // Zero flushes happened for the failed photo, so no row was ever upserted.
    assert!(fixture.storage.get_analysis(fixture.photos[0].photo_id).unwrap().is_none());
    // The sibling's explanation stays readable.
    assert_eq!(
        fixture.storage.get_explanation(fixture.photos[1].photo_id).unwrap().unwrap(),
        "x1x2"
    );

    // Only the two analysis requests; the fanout never started.
    assert_eq!(generator.request_count(), 2);
    let class = fixture.storage.get_class(fixture.class_id).unwrap().unwrap();
    assert!(class.title.is_none());
    assert!(class.short_description.is_none());
    assert!(class.long_description.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreadable_photo_fails_without_generator_call() {
    let fixture = setup_class(&[]);
    let missing = Photo {
        photo_id: 77,
        class_id: fixture.class_id,
        file_path: "/nonexistent/board.jpg".to_owned(),
        created_at: chrono::Utc::now(),
    };
    let generator = Arc::new(ScriptedGenerator::new(vec!["x1"]));
    let pipeline = make_pipeline(&fixture, Arc::clone(&generator));

    let job = PipelineJob { class_id: fixture.class_id, photos: vec![missing] };
    let report = pipeline.run(job).await.unwrap();

    assert_eq!(report.failed_photos, vec![77]);
    assert!(report.summaries.is_none());
    assert_eq!(generator.request_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_class_still_summarizes() {
    let fixture = setup_class(&[]);
    let generator = Arc::new(ScriptedGenerator::new(vec!["t"]));
    let pipeline = make_pipeline(&fixture, Arc::clone(&generator));

    let job = PipelineJob { class_id: fixture.class_id, photos: Vec::new() };
    let report = pipeline.run(job).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.analyzed, 0);
    assert_eq!(generator.request_count(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_supervisor_submission_returns_report() {
    let fixture = setup_class(&["A"]);
    let generator = Arc::new(ScriptedGenerator::new(vec!["x1", "x2"]));
    let pipeline = Arc::new(make_pipeline(&fixture, generator));
    let supervisor = Supervisor::new(2);

    let job = PipelineJob { class_id: fixture.class_id, photos: fixture.photos.clone() };
    let handle = supervisor.submit(pipeline, job);

    let report = handle.await.unwrap().unwrap();
    assert!(report.succeeded());
    assert_eq!(
        fixture.storage.get_explanation(fixture.photos[0].photo_id).unwrap().unwrap(),
        "x1x2"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fanout_one_leg_fails_others_complete() {
    let fixture = setup_class(&[]);
    // The needle only matches the title prompt.
    let generator = ScriptedGenerator::failing_for(vec!["s1", "s2"], "at most 10 characters");

    let report: FanoutReport = generate_class_summaries(
        &generator,
        &fixture.storage,
        &ModelConfig::default(),
        fixture.class_id,
        "digest text",
    )
    .await;

    assert!(!report.succeeded());
    assert_eq!(report.failed_stages(), vec!["title"]);
    assert_eq!(report.short_description.as_deref().unwrap(), "s1s2");
    assert_eq!(report.long_description.as_deref().unwrap(), "s1s2");

    let class = fixture.storage.get_class(fixture.class_id).unwrap().unwrap();
    assert!(class.title.is_none());
    assert_eq!(class.short_description.as_deref(), Some("s1s2"));
    assert_eq!(class.long_description.as_deref(), Some("s1s2"));
}

#[tokio::test(start_paused = true)]
async fn test_summary_field_transitions_sentinel_to_final() {
    let sink = RecordingClassSink::default();
    let generator = ScriptedGenerator::slow(vec!["x1", "x2", "x3"], 1100);

    let report = generate_class_summaries(
        &generator,
        &sink,
        &ModelConfig::default(),
        1,
        "digest",
    )
    .await;

    assert!(report.succeeded());
    let titles = sink.titles.lock().unwrap();
    assert!(titles.len() >= 2, "expected at least one intermediate flush");
    let (last, intermediate) = titles.split_last().unwrap();
    assert!(intermediate.iter().all(|w| is_generating(w)));
    assert_eq!(last, "x1x2x3");
    assert!(!is_generating(last));
}
