//! Lazy, pull-based frame sequence.
//!
//! [`FrameSource`] is the canonical streaming primitive for the
//! video-to-frames direction: it implements [`Iterator`] and decodes just
//! enough packets per [`next()`](Iterator::next) call to produce one frame.
//! The eager ([`collect_frames`](FrameSource::collect_frames)) and
//! callback-driven ([`for_each_frame`](FrameSource::for_each_frame))
//! consumption modes are thin adapters over the same iteration, so all three
//! share one decode path.
//!
//! # Example
//!
//! ```no_run
//! use videoframes::AssetHandle;
//!
//! let source = AssetHandle::open("input.mp4")?.frames()?;
//! for result in source {
//!     let (index, image) = result?;
//!     image.save(format!("frame_{index:06}.png"))?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    format::context::Input,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{
    asset::AssetHandle,
    conversion,
    error::VideoFramesError,
    info::VideoInfo,
    options::ExtractOptions,
    progress::{OperationType, ProgressTracker},
};

/// A finite, lazy sequence of decoded frames.
///
/// Yields `Result<(index, image), _>` for indices `0..frame_count` in
/// strictly increasing order. A decode failure is terminal: the failing step
/// yields `Err` and the sequence ends; frames already delivered are
/// unaffected. Dropping the source stops decoding — remaining frames are
/// never materialized.
///
/// The source is not restartable; open a new [`AssetHandle`] to iterate
/// again.
pub struct FrameSource {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    info: VideoInfo,
    frame_count: u64,
    /// Index of the next frame to yield.
    next_index: u64,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl FrameSource {
    /// Build a source over all frames of the asset, starting at frame 0.
    pub(crate) fn new(asset: AssetHandle) -> Result<Self, VideoFramesError> {
        let AssetHandle {
            input,
            info,
            stream_index,
            ..
        } = asset;

        let stream = input.stream(stream_index).ok_or_else(|| {
            VideoFramesError::MetadataUnavailable("video stream disappeared".to_string())
        })?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            info.width,
            info.height,
            ScalingFlags::BILINEAR,
        )?;

        let frame_count = info.frame_count();

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            info,
            frame_count,
            next_index: 0,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// The metadata of the underlying source.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Total number of frames this source will yield when fully drained.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Eagerly decode every frame into an in-memory vector.
    ///
    /// Convenience for small jobs; memory use is proportional to the frame
    /// count. Stops at the first decode failure.
    pub fn collect_frames(self) -> Result<Vec<DynamicImage>, VideoFramesError> {
        let mut frames = Vec::with_capacity(self.frame_count as usize);
        for result in self {
            let (_, image) = result?;
            frames.push(image);
        }
        Ok(frames)
    }

    /// Decode frames sequentially, handing each to `handler`.
    ///
    /// Progress is reported through `options` before each handled frame, and
    /// the attached [`CancellationToken`](crate::CancellationToken) is
    /// checked at every step. The first error — from decoding, cancellation,
    /// or the handler itself — ends the operation.
    pub fn for_each_frame<F>(
        mut self,
        options: &ExtractOptions,
        mut handler: F,
    ) -> Result<(), VideoFramesError>
    where
        F: FnMut(u64, DynamicImage) -> Result<(), VideoFramesError>,
    {
        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameExtraction,
            Some(self.frame_count),
            options.batch_size,
        );

        while let Some(result) = self.next() {
            if options.is_cancelled() {
                return Err(VideoFramesError::Cancelled);
            }
            let (index, image) = result?;
            tracker.advance(Some(index));
            handler(index, image)?;
        }

        tracker.finish();
        Ok(())
    }

    /// Scale and convert the current decoded frame.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, VideoFramesError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        conversion::rgb_frame_to_image(&self.rgb_frame, self.info.width, self.info.height)
    }
}

impl Iterator for FrameSource {
    type Item = Result<(u64, DynamicImage), VideoFramesError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_index >= self.frame_count {
            return None;
        }

        loop {
            // Drain a frame the decoder has already produced. Frames arrive
            // in presentation order, so the running counter is the index.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                match self.convert_current_frame() {
                    Ok(image) => {
                        let index = self.next_index;
                        self.next_index += 1;
                        if self.next_index >= self.frame_count {
                            self.done = true;
                        }
                        return Some(Ok((index, image)));
                    }
                    Err(error) => {
                        self.done = true;
                        return Some(Err(error));
                    }
                }
            }

            // Decoder has no buffered frames; feed it more packets.
            if self.eof_sent {
                // Container ended before frame_count frames materialized;
                // the metadata-derived count overstated the stream.
                log::warn!(
                    "Stream ended after {} of {} expected frame(s)",
                    self.next_index,
                    self.frame_count,
                );
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.done = true;
                            return Some(Err(VideoFramesError::FrameDecodeFailed(
                                error.to_string(),
                            )));
                        }
                    }
                    // Non-video packets are skipped.
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        self.done = true;
                        return Some(Err(VideoFramesError::FrameDecodeFailed(
                            error.to_string(),
                        )));
                    }
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Transient read error; try the next packet.
                }
            }
        }
    }
}
