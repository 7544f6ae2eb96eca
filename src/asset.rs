//! Video asset handle.
//!
//! [`AssetHandle`] opens a video source, resolves its [`VideoInfo`], and
//! exposes frame extraction bound to that metadata. Random access goes
//! through [`extract_frame`](AssetHandle::extract_frame); sequential access
//! through [`frames`](AssetHandle::frames), which converts the handle into a
//! [`FrameSource`](crate::FrameSource).

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{
    conversion, error::VideoFramesError, info::MAX_FRAME_RATE, info::VideoInfo,
    source::FrameSource, timing,
};

/// An open video source together with its resolved metadata.
///
/// The handle owns the demuxer context; dropping it closes the file. Frame
/// extraction is not safe for concurrent calls against the same handle —
/// in a pipeline, only the single producer stage may drive it.
///
/// # Example
///
/// ```no_run
/// use videoframes::AssetHandle;
///
/// let mut asset = AssetHandle::open("input.mp4")?;
/// println!("{} frames at {} fps", asset.info().frame_count(), asset.info().fps);
/// let first = asset.extract_frame(0)?;
/// first.save("first_frame.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AssetHandle {
    pub(crate) input: Input,
    pub(crate) info: VideoInfo,
    pub(crate) stream_index: usize,
    pub(crate) path: PathBuf,
}

impl std::fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetHandle")
            .field("info", &self.info)
            .field("stream_index", &self.stream_index)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl AssetHandle {
    /// Open a video source and resolve its metadata.
    ///
    /// # Errors
    ///
    /// - [`VideoFramesError::SourceNotFound`] if the path does not exist or
    ///   cannot be opened by the demuxer.
    /// - [`VideoFramesError::MetadataUnavailable`] if the file has no video
    ///   track or its parameters cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoFramesError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video source: {}", path.display());

        if !path.exists() {
            return Err(VideoFramesError::SourceNotFound {
                path,
                reason: "no such file".to_string(),
            });
        }

        // Initialise FFmpeg (idempotent).
        ffmpeg_next::init().map_err(|error| VideoFramesError::SourceNotFound {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input =
            ffmpeg_next::format::input(&path).map_err(|error| VideoFramesError::SourceNotFound {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let info = resolve_info(&input)?;
        let stream_index = input
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or_else(|| {
                VideoFramesError::MetadataUnavailable("no video track found".to_string())
            })?;

        log::debug!(
            "Resolved {}x{} @ {:.3} fps, {} frames, stereoscopic: {}",
            info.width,
            info.height,
            info.fps,
            info.frame_count(),
            info.is_stereoscopic,
        );

        Ok(Self {
            input,
            info,
            stream_index,
            path,
        })
    }

    /// The resolved metadata of this source.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// The path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract a single frame by index.
    ///
    /// Seeks to the keyframe preceding the exact computed timestamp and
    /// decodes forward with zero tolerance: the returned image is the frame
    /// at the requested index (or the one immediately adjacent when the
    /// container's timestamps do not land exactly), never a keyframe the
    /// backend found more convenient. This keeps the index ↔ frame mapping
    /// deterministic.
    ///
    /// # Errors
    ///
    /// - [`VideoFramesError::FrameIndexOutOfRange`] if `frame_index` is not
    ///   in `[0, frame_count)`.
    /// - [`VideoFramesError::FrameDecodeFailed`] if the backend cannot
    ///   materialize the image.
    pub fn extract_frame(&mut self, frame_index: u64) -> Result<DynamicImage, VideoFramesError> {
        let frame_count = self.info.frame_count();
        if frame_index >= frame_count {
            return Err(VideoFramesError::FrameIndexOutOfRange {
                frame_index,
                frame_count,
                fps: self.info.fps,
            });
        }

        let fps = self.info.fps;
        let width = self.info.width;
        let height = self.info.height;

        // Fresh decoder from the stream parameters.
        let stream = self.input.stream(self.stream_index).ok_or_else(|| {
            VideoFramesError::MetadataUnavailable("video stream disappeared".to_string())
        })?;
        let time_base = stream.time_base();
        // Backend failures from here on mean the image cannot be
        // materialized, whatever the underlying cause.
        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;
        let mut decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;

        // Seek to the keyframe at or before the exact frame timestamp, then
        // decode forward to the frame itself.
        let target_timestamp = timing::frame_to_seek_timestamp(frame_index, fps);
        self.input
            .seek(target_timestamp, ..target_timestamp)
            .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current = timing::pts_to_frame_number(pts, time_base, fps);

                // Exact hit, or the first frame past the target when the
                // index does not map onto a stored timestamp.
                if current >= frame_index {
                    scaler
                        .run(&decoded_frame, &mut rgb_frame)
                        .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;
                    return conversion::rgb_frame_to_image(&rgb_frame, width, height);
                }
            }
        }

        // Flush the decoder.
        decoder
            .send_eof()
            .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.pts().unwrap_or(0);
            let current = timing::pts_to_frame_number(pts, time_base, fps);

            if current >= frame_index {
                scaler
                    .run(&decoded_frame, &mut rgb_frame)
                    .map_err(|error| VideoFramesError::FrameDecodeFailed(error.to_string()))?;
                return conversion::rgb_frame_to_image(&rgb_frame, width, height);
            }
        }

        Err(VideoFramesError::FrameDecodeFailed(format!(
            "could not locate frame {frame_index} in {}",
            self.path.display()
        )))
    }

    /// Convert this handle into a lazy sequence over all frames.
    ///
    /// The source decodes from frame 0 without per-frame seeking; it is
    /// finite (bounded by the frame count) and not restartable — open a new
    /// handle to iterate again.
    pub fn frames(self) -> Result<FrameSource, VideoFramesError> {
        FrameSource::new(self)
    }
}

/// Resolve [`VideoInfo`] from an open demuxer context.
fn resolve_info(input: &Input) -> Result<VideoInfo, VideoFramesError> {
    let stream = input.streams().best(Type::Video).ok_or_else(|| {
        VideoFramesError::MetadataUnavailable("no video track found".to_string())
    })?;

    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        VideoFramesError::MetadataUnavailable(format!("failed to read codec parameters: {error}"))
    })?;
    let decoder = decoder_context.decoder().video().map_err(|error| {
        VideoFramesError::MetadataUnavailable(format!("failed to create video decoder: {error}"))
    })?;

    let duration_microseconds = input.duration();
    let duration = if duration_microseconds > 0 {
        duration_microseconds as f64 / 1_000_000.0
    } else {
        0.0
    };

    let frame_rate = stream.avg_frame_rate();
    let fps = if frame_rate.denominator() != 0 {
        frame_rate.numerator() as f64 / frame_rate.denominator() as f64
    } else {
        let rate = stream.rate();
        if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        }
    };

    if fps > MAX_FRAME_RATE {
        log::warn!("Container reports {fps} fps; clamping to {MAX_FRAME_RATE}");
    }

    // Best-effort stereoscopic detection from container-level stream tags.
    // Absence of a tag means mono, never an error.
    let is_stereoscopic = stream
        .metadata()
        .get("stereo_mode")
        .is_some_and(|mode| mode != "mono");

    Ok(VideoInfo::new(
        duration,
        fps,
        decoder.width(),
        decoder.height(),
        is_stereoscopic,
    ))
}
