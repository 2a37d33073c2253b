//! The durable-write discipline every streaming producer follows.

use std::future::Future;
use std::time::Duration;

use boardlens_core::{FLUSH_INTERVAL_MS, SENTINEL_SUFFIX};
use boardlens_llm::TextStream;
use boardlens_storage::StorageError;
use futures_util::StreamExt;

use crate::error::PipelineError;

/// Fold a delta stream into its full text, flushing through `write` along
/// the way.
///
/// A flush happens when a delta arrives at least [`FLUSH_INTERVAL_MS`] after
/// the previous write, bounding write amplification to about one write per
/// second per stream while keeping reader staleness to about a second. Every
/// non-final flush carries the sentinel suffix; the final write (after the
/// stream's completion signal) is the exact accumulated text. Writes are
/// awaited one at a time, so a key never has two writes in flight.
///
/// On a stream error no further write is issued: the last flushed,
/// sentinel-suffixed value stays durable, and if the error came before any
/// flush the key was never written at all.
pub async fn drain_stream<F, Fut>(
    mut stream: TextStream,
    mut write: F,
) -> Result<String, PipelineError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), StorageError>>,
{
    let flush_interval = Duration::from_millis(FLUSH_INTERVAL_MS);
    let mut accumulated = String::new();
    let mut last_flush = tokio::time::Instant::now();

    while let Some(delta) = stream.next().await {
        accumulated.push_str(&delta?);

        if last_flush.elapsed() >= flush_interval {
            write(format!("{accumulated}{SENTINEL_SUFFIX}")).await?;
            last_flush = tokio::time::Instant::now();
        }
    }

    write(accumulated.clone()).await?;
    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use boardlens_core::is_generating;
    use boardlens_llm::{LlmError, TextStream};

    use super::drain_stream;
    use crate::error::PipelineError;

    fn slow_stream(chunks: Vec<Result<&'static str, ()>>) -> TextStream {
        Box::pin(async_stream::stream! {
            for (i, chunk) in chunks.into_iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(1100)).await;
                }
                match chunk {
                    Ok(text) => yield Ok(text.to_owned()),
                    Err(()) => yield Err(LlmError::StreamClosed),
                }
            }
        })
    }

    fn recording_sink(
        writes: &Arc<Mutex<Vec<String>>>,
    ) -> impl FnMut(String) -> std::future::Ready<Result<(), boardlens_storage::StorageError>> + use<> {
        let writes = Arc::clone(writes);
        move |text| {
            writes.lock().unwrap().push(text);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_intermediate_flushes_carry_sentinel_final_does_not() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream = slow_stream(vec![Ok("x1"), Ok("x2"), Ok("x3")]);

        let final_text = drain_stream(stream, recording_sink(&writes)).await.unwrap();

        assert_eq!(final_text, "x1x2x3");
        let writes = writes.lock().unwrap();
        assert_eq!(*writes, vec!["x1x2 ...", "x1x2x3 ...", "x1x2x3"]);
        let (last, intermediate) = writes.split_last().unwrap();
        assert!(intermediate.iter().all(|w| is_generating(w)));
        assert!(!is_generating(last));
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_monotonically_grow() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream = slow_stream(vec![Ok("a"), Ok("b"), Ok("c"), Ok("d")]);

        drain_stream(stream, recording_sink(&writes)).await.unwrap();

        let writes = writes.lock().unwrap();
        for pair in writes.windows(2) {
            let prev = pair[0].trim_end_matches(" ...");
            let next = pair[1].trim_end_matches(" ...");
            assert!(next.starts_with(prev), "{next:?} does not extend {prev:?}");
        }
    }

    #[tokio::test]
    async fn test_fast_stream_single_final_write() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream: TextStream = Box::pin(futures_util::stream::iter(vec![
            Ok("x1".to_owned()),
            Ok("x2".to_owned()),
        ]));

        let final_text = drain_stream(stream, recording_sink(&writes)).await.unwrap();

        assert_eq!(final_text, "x1x2");
        assert_eq!(*writes.lock().unwrap(), vec!["x1x2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_error_after_flush_leaves_sentinel_value() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream = slow_stream(vec![Ok("x1"), Ok("x2"), Err(())]);

        let err = drain_stream(stream, recording_sink(&writes)).await.unwrap_err();

        assert!(matches!(err, PipelineError::Generation(LlmError::StreamClosed)));
        let writes = writes.lock().unwrap();
        assert_eq!(*writes, vec!["x1x2 ..."]);
        assert!(is_generating(writes.last().unwrap()));
    }

    #[tokio::test]
    async fn test_stream_error_before_any_flush_writes_nothing() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream: TextStream =
            Box::pin(futures_util::stream::iter(vec![Err(LlmError::StreamClosed)]));

        let err = drain_stream(stream, recording_sink(&writes)).await.unwrap_err();

        assert!(matches!(err, PipelineError::Generation(_)));
        assert!(writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_stream_writes_empty_final() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stream: TextStream = Box::pin(futures_util::stream::iter(Vec::new()));

        let final_text = drain_stream(stream, recording_sink(&writes)).await.unwrap();

        assert_eq!(final_text, "");
        assert_eq!(*writes.lock().unwrap(), vec![""]);
    }
}
