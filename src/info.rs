//! Video metadata.
//!
//! [`VideoInfo`] is the immutable description of a video source: duration,
//! frame rate, natural size, and a best-effort stereoscopic flag. It can be
//! built from explicit values or by probing a file with
//! [`VideoInfo::probe`].

use std::path::Path;

use crate::{asset::AssetHandle, error::VideoFramesError};

/// Upper bound applied to frame rates read from container metadata.
///
/// Malformed files occasionally report absurd rates that would make the
/// derived frame count explode; anything above this is clamped down.
pub const MAX_FRAME_RATE: f64 = 240.0;

/// Metadata for a video source.
///
/// Immutable once constructed. The frame count is derived, not stored:
/// `frame_count = floor(duration × fps)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Duration in seconds.
    pub duration: f64,
    /// Frames per second, clamped to [`MAX_FRAME_RATE`] at construction.
    pub fps: f64,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Whether the source carries left/right stereo eye views. Best-effort;
    /// `false` when the container reports nothing.
    pub is_stereoscopic: bool,
}

impl VideoInfo {
    /// Build metadata from explicit values.
    ///
    /// `fps` is clamped to [`MAX_FRAME_RATE`]; a negative duration is
    /// clamped to zero.
    pub fn new(duration: f64, fps: f64, width: u32, height: u32, is_stereoscopic: bool) -> Self {
        Self {
            duration: duration.max(0.0),
            fps: fps.min(MAX_FRAME_RATE),
            width,
            height,
            is_stereoscopic,
        }
    }

    /// Probe a video file and resolve its metadata.
    ///
    /// Opens the source, reads track metadata, and closes it again. Probing
    /// the same unchanged file twice yields identical results.
    ///
    /// # Errors
    ///
    /// - [`VideoFramesError::SourceNotFound`] if the path does not exist or
    ///   cannot be opened.
    /// - [`VideoFramesError::MetadataUnavailable`] if the file has no video
    ///   track.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self, VideoFramesError> {
        let asset = AssetHandle::open(path)?;
        Ok(asset.info().clone())
    }

    /// The number of whole frames in the source: `floor(duration × fps)`.
    pub fn frame_count(&self) -> u64 {
        (self.duration * self.fps) as u64
    }
}
