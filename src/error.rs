//! Error types for the `videoframes` crate.
//!
//! This module defines [`VideoFramesError`], the unified error type returned
//! by all fallible operations in the crate. Variants carry enough context
//! (paths, frame indices, upstream messages) to diagnose a failure without
//! extra logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `videoframes` operations.
///
/// Every public method that can fail returns `Result<T, VideoFramesError>`.
/// Decode, convert, and write errors are terminal for the current job and are
/// never retried internally; callers may retry the whole job. A failed encode
/// leaves its partial output file on disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VideoFramesError {
    /// The video source path does not exist or cannot be opened.
    #[error("Video source not found at {}: {reason}", .path.display())]
    SourceNotFound {
        /// Path that was passed to [`crate::AssetHandle::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source was opened but its track metadata could not be resolved
    /// (for example, the file has no video track).
    #[error("Video metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// A frame index outside `[0, frame_count)` was requested.
    #[error("Frame {frame_index} is out of range (video has {frame_count} frames at {fps} fps)")]
    FrameIndexOutOfRange {
        /// The frame index that was requested.
        frame_index: u64,
        /// The total number of frames in the video.
        frame_count: u64,
        /// The frame rate used to derive the count.
        fps: f64,
    },

    /// The backend could not materialize the frame at the computed timestamp.
    #[error("Failed to decode frame: {0}")]
    FrameDecodeFailed(String),

    /// A frame could not be converted to the pixel buffer format the encoder
    /// requires.
    #[error("Pixel conversion failed: {0}")]
    PixelConversionFailed(String),

    /// The encoder session started but its conversion buffers could not be
    /// initialized. No frames were accepted.
    #[error("Encoder sink failed to initialize: {0}")]
    SinkInitializationFailed(String),

    /// Writing an encoded frame to the container failed.
    #[error("Encoder sink write failed: {0}")]
    SinkWriteFailed(String),

    /// Finalizing the container failed (trailer write, disk full).
    #[error("Encoder sink finalization failed: {0}")]
    SinkFinalizeFailed(String),

    /// A frame was pushed after the sink was finalized or had failed.
    #[error("Encoder sink is closed")]
    SinkClosed,

    /// An unsupported image or container format was requested.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The input folder contains no eligible frame image files.
    #[error("No frames found in {}", .0.display())]
    NoFramesFound(PathBuf),

    /// The operation was cancelled, either via a
    /// [`CancellationToken`](crate::CancellationToken) or because the other
    /// pipeline stage stopped.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding an image
    /// file.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for VideoFramesError {
    fn from(error: FfmpegError) -> Self {
        VideoFramesError::Ffmpeg(error.to_string())
    }
}
