//! Producer/consumer encoding pipeline.
//!
//! [`EncodePipeline`] runs a frame-producing stage and a sink-consuming
//! stage concurrently, connected by a bounded channel. Decoding and encoding
//! are CPU-heavy FFmpeg work, so both stages run on
//! `tokio::task::spawn_blocking` threads rather than on the async runtime's
//! cooperative budget; the channel provides ordering and backpressure
//! between them.
//!
//! Failure model: the first error on either side stops the pipeline. A
//! producer failure travels to the consumer as an in-band channel item, so
//! end-of-stream (channel closed) and failure are never confused. A
//! consumer failure drops the receiving half, which the producer observes
//! at its next send and stops pulling frames. The coordinator waits for
//! both stages to terminate before returning, exactly once.
//!
//! # Example
//!
//! ```no_run
//! use videoframes::{EncodePipeline, EncodeSink, VideoCodec, VideoContainer};
//!
//! # async fn example() -> Result<(), videoframes::VideoFramesError> {
//! let paths = vec!["frame_000000.png".to_string(), "frame_000001.png".to_string()];
//!
//! let encoded = EncodePipeline::new()
//!     .run(
//!         move || {
//!             Ok(paths.into_iter().enumerate().map(|(index, path)| {
//!                 let image = image::open(&path)
//!                     .map_err(videoframes::VideoFramesError::from)?;
//!                 Ok((index as u64, image))
//!             }))
//!         },
//!         move || {
//!             EncodeSink::open(
//!                 "output.mp4", 320, 240, 30.0, 1000,
//!                 VideoCodec::H264, VideoContainer::Mp4,
//!             )
//!         },
//!     )
//!     .await?;
//! println!("encoded {encoded} frame(s)");
//! # Ok(())
//! # }
//! ```

use image::DynamicImage;
use tokio::sync::mpsc;

use crate::{error::VideoFramesError, sink::FrameSink};

/// Default bounded-channel capacity between the stages.
///
/// Kept small so at most a handful of decoded frames are in flight; the
/// producer blocks once the consumer falls behind.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// One frame travelling through the pipeline channel.
type FrameItem = Result<(u64, DynamicImage), VideoFramesError>;

/// Coordinates a frame producer and a [`FrameSink`] consumer.
///
/// Both stages are constructed *inside* their worker tasks via the factory
/// closures passed to [`run`](EncodePipeline::run), so neither the frame
/// iterator nor the sink needs to be `Send` — only the factories do. This
/// also guarantees each stage's backend resources are created and released
/// on the thread that uses them, on every exit path.
#[derive(Debug, Clone)]
pub struct EncodePipeline {
    channel_capacity: usize,
}

impl Default for EncodePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodePipeline {
    /// Create a pipeline with the default channel capacity.
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the bounded channel capacity (clamped to a minimum of 1).
    ///
    /// Capacity 1 gives the tightest producer/consumer coupling: the
    /// producer decodes at most one frame beyond what the consumer has
    /// accepted.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Run the pipeline to completion and return the number of frames the
    /// sink accepted.
    ///
    /// `make_source` builds the frame sequence and `make_sink` the sink,
    /// each on its own blocking worker. Frames flow through the bounded
    /// channel in strictly increasing order; the consumer waits for sink
    /// readiness (yielding between polls) before each push, and finalizes
    /// the sink exactly once when the producer signals successful
    /// exhaustion.
    ///
    /// # Errors
    ///
    /// The first error from either stage, after both stages have fully
    /// stopped. When both fail near-simultaneously the producer's error
    /// wins, as the root cause — unless the producer merely observed the
    /// cancellation triggered by the consumer's failure.
    pub async fn run<P, I, C, S>(
        &self,
        make_source: P,
        make_sink: C,
    ) -> Result<u64, VideoFramesError>
    where
        P: FnOnce() -> Result<I, VideoFramesError> + Send + 'static,
        I: IntoIterator<Item = FrameItem>,
        C: FnOnce() -> Result<S, VideoFramesError> + Send + 'static,
        S: FrameSink,
    {
        let (sender, mut receiver) = mpsc::channel::<FrameItem>(self.channel_capacity);

        let producer = tokio::task::spawn_blocking(move || -> Result<(), VideoFramesError> {
            let frames = make_source()?;
            for item in frames {
                match item {
                    Ok(frame) => {
                        // blocking_send returns only once the channel has
                        // accepted the frame, so frame i+1 is never decoded
                        // ahead of frame i beyond the channel capacity; a
                        // send failure means the consumer is gone.
                        if sender.blocking_send(Ok(frame)).is_err() {
                            return Err(VideoFramesError::Cancelled);
                        }
                    }
                    Err(error) => {
                        // Deliver the failure in-band so the consumer can
                        // distinguish it from successful exhaustion.
                        return match sender.blocking_send(Err(error)) {
                            Ok(()) => Ok(()),
                            Err(mpsc::error::SendError(Err(error))) => Err(error),
                            Err(_) => Err(VideoFramesError::Cancelled),
                        };
                    }
                }
            }
            Ok(())
        });

        let consumer = tokio::task::spawn_blocking(move || -> Result<u64, VideoFramesError> {
            let mut sink = make_sink()?;
            let mut accepted: u64 = 0;

            while let Some(item) = receiver.blocking_recv() {
                // Dropping `receiver` on any early return below is what
                // cancels the producer.
                let (_, image) = item?;

                while !sink.poll_ready()? {
                    std::thread::yield_now();
                }

                sink.push(image)?;
                accepted += 1;
            }

            // Channel closed without an in-band error: the producer is
            // exhausted. Finalize once.
            sink.finish()?;
            Ok(accepted)
        });

        let (producer_result, consumer_result) = tokio::join!(producer, consumer);

        // A panicked stage counts as cancelled; the other stage has already
        // stopped by the time join! returns.
        let producer_result = producer_result.unwrap_or(Err(VideoFramesError::Cancelled));
        let consumer_result = consumer_result.unwrap_or(Err(VideoFramesError::Cancelled));

        match (producer_result, consumer_result) {
            (Ok(()), Ok(accepted)) => Ok(accepted),
            (Err(producer_error), _)
                if !matches!(producer_error, VideoFramesError::Cancelled) =>
            {
                Err(producer_error)
            }
            (_, Err(consumer_error)) => Err(consumer_error),
            (Err(producer_error), Ok(_)) => Err(producer_error),
        }
    }
}
