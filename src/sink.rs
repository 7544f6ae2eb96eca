//! Encoder sink — consume frames one at a time into a video file.
//!
//! [`EncodeSink`] owns the output container and drives a four-state machine:
//! opening transitions it straight into `Writing`; [`push`](EncodeSink::push)
//! accepts frames under a readiness gate; [`finish`](EncodeSink::finish)
//! finalizes the container exactly once. Any write error moves the sink to
//! `Failed`, after which further pushes are rejected with
//! [`VideoFramesError::SinkClosed`].
//!
//! Exactly one sink may hold a given output path's writer: the sink owns the
//! writer from open to finalization by construction, so no external
//! coordination is needed.

use std::path::Path;

use ffmpeg_next::{
    Packet, Rational,
    codec::Id,
    codec::context::Context as CodecContext,
    encoder::Video as VideoEncoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{conversion, error::VideoFramesError, timing};

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264 / AVC. The default.
    H264,
    /// H.265 / HEVC.
    Hevc,
    /// Apple ProRes.
    ProRes,
}

impl VideoCodec {
    fn codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::Hevc => Id::HEVC,
            VideoCodec::ProRes => Id::PRORES,
        }
    }

    /// The pixel format handed to the encoder.
    fn encoder_pixel_format(self) -> Pixel {
        match self {
            // H.264/H.265 encoders take YUV420P input.
            VideoCodec::H264 | VideoCodec::Hevc => Pixel::YUV420P,
            VideoCodec::ProRes => Pixel::YUV422P10LE,
        }
    }
}

/// Supported output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    /// QuickTime `.mov`.
    Mov,
    /// MPEG-4 `.mp4`.
    Mp4,
}

impl VideoContainer {
    /// All container variants, for error messages.
    pub const ALL: [VideoContainer; 2] = [VideoContainer::Mov, VideoContainer::Mp4];

    /// Map a file extension (without dot, case-insensitive) to a container.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mov" => Some(VideoContainer::Mov),
            "mp4" => Some(VideoContainer::Mp4),
            _ => None,
        }
    }

    /// The FFmpeg muxer name.
    pub fn muxer_name(self) -> &'static str {
        match self {
            VideoContainer::Mov => "mov",
            VideoContainer::Mp4 => "mp4",
        }
    }
}

/// Anything that can consume an ordered frame sequence.
///
/// This is the seam between the [`EncodePipeline`](crate::EncodePipeline)
/// consumer stage and the actual encoder; tests substitute their own sinks.
/// The caller must wait for [`poll_ready`](FrameSink::poll_ready) to return
/// `true` before each [`push`](FrameSink::push), yielding between polls
/// rather than spinning.
pub trait FrameSink {
    /// Whether the sink can accept another frame right now.
    ///
    /// The default implementation is always ready.
    fn poll_ready(&mut self) -> Result<bool, VideoFramesError> {
        Ok(true)
    }

    /// Consume the next frame. Ownership of the image passes to the sink.
    fn push(&mut self, image: DynamicImage) -> Result<(), VideoFramesError>;

    /// Finalize after the last frame. Called exactly once, and only when
    /// every pushed frame was accepted.
    fn finish(&mut self) -> Result<(), VideoFramesError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Writing,
    Closed,
    Failed,
}

/// Packet drains during finalization are part of finalization: a write
/// failure there surfaces as [`VideoFramesError::SinkFinalizeFailed`].
fn as_finalize_error(error: VideoFramesError) -> VideoFramesError {
    match error {
        VideoFramesError::SinkWriteFailed(reason) => VideoFramesError::SinkFinalizeFailed(reason),
        other => other,
    }
}

/// Encodes an ordered sequence of frames into a video file.
///
/// Created via [`EncodeSink::open`], which starts the container session
/// immediately. Frames are timestamped with the sink's running counter
/// through [`timing::timestamp_for_frame`], so presentation times increase
/// strictly regardless of arrival speed.
///
/// # Example
///
/// ```no_run
/// use videoframes::{EncodeSink, FrameSink, VideoCodec, VideoContainer};
///
/// let frame = image::DynamicImage::new_rgba8(320, 240);
/// let mut sink = EncodeSink::open(
///     "output.mp4", 320, 240, 30.0, 1000, VideoCodec::H264, VideoContainer::Mp4,
/// )?;
/// sink.push(frame)?;
/// sink.finish()?;
/// # Ok::<(), videoframes::VideoFramesError>(())
/// ```
pub struct EncodeSink {
    output: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    encoder_time_base: Rational,
    /// Running frame counter; doubles as the next frame's index.
    frames_written: u64,
    state: SinkState,
}

impl EncodeSink {
    /// Open an output file and start the encoder session.
    ///
    /// # Panics
    ///
    /// `fps` and `bitrate_kbps` must be positive; violating this is a
    /// programming error, not a recoverable failure.
    ///
    /// # Errors
    ///
    /// - [`VideoFramesError::UnsupportedFormat`] if `fps` has no exact
    ///   integer timescale (rates above ~2147 fps or vanishingly small
    ///   ones); rejected before the output file is touched.
    /// - [`VideoFramesError::SinkInitializationFailed`] if the pixel
    ///   converter cannot be built after the container session has started;
    ///   the sink is unusable and no frames were accepted.
    /// - [`VideoFramesError::Ffmpeg`] if the muxer or encoder cannot be
    ///   opened at all.
    pub fn open<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: f64,
        bitrate_kbps: u32,
        codec: VideoCodec,
        container: VideoContainer,
    ) -> Result<Self, VideoFramesError> {
        assert!(fps > 0.0, "frame rate must be positive, got {fps}");
        assert!(bitrate_kbps > 0, "bitrate must be positive");

        // Reject rates whose timescale cannot be represented before any
        // output state is created; otherwise every timestamp in the file
        // would describe a different rate than the one requested.
        let timescale = timing::checked_timescale_for_fps(fps).ok_or_else(|| {
            VideoFramesError::UnsupportedFormat(format!(
                "frame rate {fps} has no exact integer timescale"
            ))
        })?;

        let path = path.as_ref();
        log::info!(
            "Opening encode sink {} ({}x{} @ {} fps, {} kbps, {:?}/{:?})",
            path.display(),
            width,
            height,
            fps,
            bitrate_kbps,
            codec,
            container,
        );

        ffmpeg_next::init()?;

        let mut output = ffmpeg_next::format::output_as(&path, container.muxer_name())?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec_id = codec.codec_id();
        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            VideoFramesError::UnsupportedFormat(format!("encoder for {codec_id:?} not available"))
        })?;

        let mut stream = output.add_stream(encoder_codec)?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())?
            .encoder()
            .video()?;

        // The encoder time base matches the frame-rate timescale, so frame
        // timestamps are exact multiples of TIMESTAMP_SCALE.
        let encoder_time_base = Rational::new(1, timescale);

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(codec.encoder_pixel_format());
        encoder.set_time_base(encoder_time_base);
        // fps as an exact rational: timescale / TIMESTAMP_SCALE.
        encoder.set_frame_rate(Some(Rational::new(
            timescale,
            timing::TIMESTAMP_SCALE as i32,
        )));
        encoder.set_bit_rate(bitrate_kbps as usize * 1000);

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder.open_as(encoder_codec)?;
        stream.set_parameters(&encoder);

        // The session starts here; everything after a failed header write
        // leaves a partial file behind, which callers may inspect.
        output.write_header()?;

        // Conversion buffers come after the session start. If they cannot be
        // allocated the sink never accepts a frame.
        let scaler = ScalingContext::get(
            Pixel::RGBA,
            width,
            height,
            codec.encoder_pixel_format(),
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| {
            VideoFramesError::SinkInitializationFailed(format!(
                "pixel converter unavailable: {error}"
            ))
        })?;

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            width,
            height,
            fps,
            encoder_time_base,
            frames_written: 0,
            state: SinkState::Writing,
        })
    }

    /// Number of frames accepted so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Receive every packet the encoder has ready and write it to the
    /// container.
    fn drain_packets(&mut self) -> Result<(), VideoFramesError> {
        let stream_time_base = self
            .output
            .stream(self.stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| {
                VideoFramesError::SinkWriteFailed("output stream disappeared".to_string())
            })?;

        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|error| VideoFramesError::SinkWriteFailed(error.to_string()))?;
        }
        Ok(())
    }
}

impl FrameSink for EncodeSink {
    /// The encoder is ready once its pending packets have been written out.
    fn poll_ready(&mut self) -> Result<bool, VideoFramesError> {
        match self.state {
            SinkState::Writing => {
                if let Err(error) = self.drain_packets() {
                    self.state = SinkState::Failed;
                    return Err(error);
                }
                Ok(true)
            }
            SinkState::Closed | SinkState::Failed => Err(VideoFramesError::SinkClosed),
        }
    }

    fn push(&mut self, image: DynamicImage) -> Result<(), VideoFramesError> {
        if self.state != SinkState::Writing {
            return Err(VideoFramesError::SinkClosed);
        }

        let result = (|| {
            let rgba_frame = conversion::image_to_rgba_frame(&image, self.width, self.height)?;

            let mut encoder_frame = VideoFrame::empty();
            self.scaler
                .run(&rgba_frame, &mut encoder_frame)
                .map_err(|error| VideoFramesError::PixelConversionFailed(error.to_string()))?;

            let timestamp = timing::timestamp_for_frame(self.frames_written, self.fps);
            encoder_frame.set_pts(Some(timestamp.value));

            match self.encoder.send_frame(&encoder_frame) {
                Ok(()) => {}
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::ffi::EAGAIN => {
                    // Encoder buffers are full; drain and retry once.
                    self.drain_packets()?;
                    self.encoder
                        .send_frame(&encoder_frame)
                        .map_err(|error| VideoFramesError::SinkWriteFailed(error.to_string()))?;
                }
                Err(error) => {
                    return Err(VideoFramesError::SinkWriteFailed(error.to_string()));
                }
            }

            self.drain_packets()?;
            self.frames_written += 1;
            Ok(())
        })();

        if result.is_err() {
            self.state = SinkState::Failed;
        }
        result
    }

    /// Mark the stream finished and finalize the container.
    ///
    /// Transitions to `Closed` on success, `Failed` on a finalization error;
    /// either way the sink accepts no further frames.
    fn finish(&mut self) -> Result<(), VideoFramesError> {
        if self.state != SinkState::Writing {
            return Err(VideoFramesError::SinkClosed);
        }

        let result = (|| {
            self.encoder
                .send_eof()
                .map_err(|error| VideoFramesError::SinkFinalizeFailed(error.to_string()))?;
            self.drain_packets().map_err(as_finalize_error)?;
            self.output
                .write_trailer()
                .map_err(|error| VideoFramesError::SinkFinalizeFailed(error.to_string()))?;
            Ok(())
        })();

        self.state = match result {
            Ok(()) => SinkState::Closed,
            Err(_) => SinkState::Failed,
        };

        log::info!(
            "Encode sink finalized after {} frame(s): {:?}",
            self.frames_written,
            self.state,
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_failures_during_finalization_are_finalize_errors() {
        let remapped = as_finalize_error(VideoFramesError::SinkWriteFailed("disk full".into()));
        assert!(matches!(
            remapped,
            VideoFramesError::SinkFinalizeFailed(reason) if reason == "disk full"
        ));
    }

    #[test]
    fn non_write_errors_pass_through_finalization_unchanged() {
        let remapped = as_finalize_error(VideoFramesError::Cancelled);
        assert!(matches!(remapped, VideoFramesError::Cancelled));
    }
}
