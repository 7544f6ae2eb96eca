//! Encoding pipeline behavior tests.
//!
//! These use a recording mock sink and synthetic frame producers, so they
//! exercise ordering, error propagation, and cancellation without touching
//! FFmpeg.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use image::DynamicImage;
use videoframes::{EncodePipeline, FrameSink, VideoFramesError};

/// What the mock sink observed. Frame identity is carried in the image
/// width (frame index + 1), since `push` does not see indices.
#[derive(Default)]
struct SinkLog {
    widths: Vec<u32>,
    finish_calls: u32,
}

struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    /// Fail the push with this zero-based ordinal, if set.
    fail_at: Option<usize>,
    /// Report not-ready this many times before the first acceptance.
    not_ready_polls: u32,
}

impl RecordingSink {
    fn new(log: Arc<Mutex<SinkLog>>) -> Self {
        Self {
            log,
            fail_at: None,
            not_ready_polls: 0,
        }
    }
}

impl FrameSink for RecordingSink {
    fn poll_ready(&mut self) -> Result<bool, VideoFramesError> {
        if self.not_ready_polls > 0 {
            self.not_ready_polls -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn push(&mut self, image: DynamicImage) -> Result<(), VideoFramesError> {
        let mut log = self.log.lock().unwrap();
        if self.fail_at == Some(log.widths.len()) {
            return Err(VideoFramesError::SinkWriteFailed("mock write".to_string()));
        }
        log.widths.push(image.width());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoFramesError> {
        self.log.lock().unwrap().finish_calls += 1;
        Ok(())
    }
}

/// A synthetic frame sequence that counts how many frames were produced.
fn counted_frames(
    count: u64,
    produced: Arc<AtomicU64>,
) -> impl Iterator<Item = Result<(u64, DynamicImage), VideoFramesError>> {
    (0..count).map(move |index| {
        produced.fetch_add(1, Ordering::SeqCst);
        Ok((index, DynamicImage::new_rgb8(index as u32 + 1, 1)))
    })
}

#[tokio::test]
async fn frames_arrive_in_order_and_finish_runs_once() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);
    let produced = Arc::new(AtomicU64::new(0));
    let producer_count = Arc::clone(&produced);

    let accepted = EncodePipeline::new()
        .run(
            move || Ok(counted_frames(20, producer_count)),
            move || Ok(RecordingSink::new(sink_log)),
        )
        .await
        .expect("pipeline");

    assert_eq!(accepted, 20);
    assert_eq!(produced.load(Ordering::SeqCst), 20);

    let log = log.lock().unwrap();
    let expected: Vec<u32> = (1..=20).collect();
    assert_eq!(log.widths, expected);
    assert_eq!(log.finish_calls, 1);
}

#[tokio::test]
async fn empty_sequence_finalizes_immediately() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);

    let accepted = EncodePipeline::new()
        .run(
            move || Ok(counted_frames(0, Arc::new(AtomicU64::new(0)))),
            move || Ok(RecordingSink::new(sink_log)),
        )
        .await
        .expect("pipeline");

    assert_eq!(accepted, 0);
    let log = log.lock().unwrap();
    assert!(log.widths.is_empty());
    assert_eq!(log.finish_calls, 1);
}

#[tokio::test]
async fn producer_error_reaches_caller_without_finalizing() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);

    let result = EncodePipeline::new()
        .run(
            move || {
                Ok((0..5_u64).map(|index| {
                    if index == 3 {
                        Err(VideoFramesError::FrameDecodeFailed(format!(
                            "frame {index} unreadable"
                        )))
                    } else {
                        Ok((index, DynamicImage::new_rgb8(index as u32 + 1, 1)))
                    }
                }))
            },
            move || Ok(RecordingSink::new(sink_log)),
        )
        .await;

    assert!(matches!(result, Err(VideoFramesError::FrameDecodeFailed(_))));

    // Frames before the failure were accepted, but the sink was never
    // finalized.
    let log = log.lock().unwrap();
    assert_eq!(log.widths, [1, 2, 3]);
    assert_eq!(log.finish_calls, 0);
}

#[tokio::test]
async fn sink_failure_stops_the_producer() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);
    let produced = Arc::new(AtomicU64::new(0));
    let producer_count = Arc::clone(&produced);

    let result = EncodePipeline::new()
        .with_channel_capacity(1)
        .run(
            move || Ok(counted_frames(100, producer_count)),
            move || {
                let mut sink = RecordingSink::new(sink_log);
                sink.fail_at = Some(2);
                Ok(sink)
            },
        )
        .await;

    assert!(matches!(result, Err(VideoFramesError::SinkWriteFailed(_))));
    assert_eq!(log.lock().unwrap().finish_calls, 0);

    // With a capacity-1 channel the producer can run at most a couple of
    // frames ahead of the failing push before its next send fails.
    let produced = produced.load(Ordering::SeqCst);
    assert!(
        produced <= 5,
        "producer should stop shortly after the sink failure, produced {produced}"
    );
}

#[tokio::test]
async fn sink_construction_failure_cancels_the_producer() {
    let produced = Arc::new(AtomicU64::new(0));
    let producer_count = Arc::clone(&produced);

    let result = EncodePipeline::new()
        .with_channel_capacity(1)
        .run(
            move || Ok(counted_frames(100, producer_count)),
            move || -> Result<RecordingSink, VideoFramesError> {
                Err(VideoFramesError::SinkInitializationFailed(
                    "mock init".to_string(),
                ))
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(VideoFramesError::SinkInitializationFailed(_))
    ));

    let produced = produced.load(Ordering::SeqCst);
    assert!(
        produced <= 3,
        "producer should stop almost immediately, produced {produced}"
    );
}

#[tokio::test]
async fn cancelled_producer_surfaces_cancellation() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);

    let result = EncodePipeline::new()
        .run(
            move || {
                Ok((0..10_u64).map(|index| {
                    if index == 4 {
                        Err(VideoFramesError::Cancelled)
                    } else {
                        Ok((index, DynamicImage::new_rgb8(index as u32 + 1, 1)))
                    }
                }))
            },
            move || Ok(RecordingSink::new(sink_log)),
        )
        .await;

    assert!(matches!(result, Err(VideoFramesError::Cancelled)));
    assert_eq!(log.lock().unwrap().finish_calls, 0);
}

#[tokio::test]
async fn slow_sink_readiness_delays_but_accepts_everything() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);

    let accepted = EncodePipeline::new()
        .run(
            move || Ok(counted_frames(8, Arc::new(AtomicU64::new(0)))),
            move || {
                let mut sink = RecordingSink::new(sink_log);
                sink.not_ready_polls = 25;
                Ok(sink)
            },
        )
        .await
        .expect("pipeline");

    assert_eq!(accepted, 8);
    let log = log.lock().unwrap();
    assert_eq!(log.widths.len(), 8);
    assert_eq!(log.finish_calls, 1);
}

#[tokio::test]
async fn producer_construction_failure_reaches_caller() {
    let log = Arc::new(Mutex::new(SinkLog::default()));
    let sink_log = Arc::clone(&log);

    let result = EncodePipeline::new()
        .run(
            move || -> Result<
                std::vec::IntoIter<Result<(u64, DynamicImage), VideoFramesError>>,
                VideoFramesError,
            > {
                Err(VideoFramesError::NoFramesFound("frames".into()))
            },
            move || Ok(RecordingSink::new(sink_log)),
        )
        .await;

    assert!(matches!(result, Err(VideoFramesError::NoFramesFound(_))));
    assert_eq!(log.lock().unwrap().finish_calls, 0);
}
