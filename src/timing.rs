//! Frame-index ↔ presentation-timestamp arithmetic.
//!
//! Frame timestamps are kept rational: a frame's presentation time is
//! represented as `value / timescale` with `value = index × K` and
//! `timescale = round(fps × K)` for a fixed scale factor `K`. This makes
//! `seconds(index) == index / fps` exact in integer arithmetic, so no
//! floating-point drift accumulates across thousands of frames, and
//! timestamps are strictly increasing by construction.
//!
//! The module also carries the stream-timebase helpers the decode and encode
//! paths share (PTS ↔ frame number, seek timestamps).

use ffmpeg_next::Rational;

/// Fixed timestamp scale factor.
///
/// Large enough that frame rates with up to three decimal digits (29.97,
/// 23.976) map to an integer timescale without loss.
pub const TIMESTAMP_SCALE: i64 = 1_000_000;

/// A rational presentation timestamp: `value / timescale` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Timestamp value in `1/timescale` units.
    pub value: i64,
    /// Ticks per second.
    pub timescale: i32,
}

impl Timestamp {
    /// The timestamp in seconds, as a float. Exact division of the rational
    /// representation; only the final conversion is floating point.
    pub fn seconds(&self) -> f64 {
        self.value as f64 / self.timescale as f64
    }
}

/// Compute the presentation timestamp of a frame index at the given rate.
///
/// Successive indices produce strictly increasing timestamps.
///
/// # Panics
///
/// `fps` must be positive; a non-positive rate is a programming error in the
/// caller (frame rates are validated once, at [`crate::VideoInfo`]
/// construction), not a recoverable condition.
pub fn timestamp_for_frame(frame_index: u64, fps: f64) -> Timestamp {
    assert!(fps > 0.0, "frame rate must be positive, got {fps}");
    Timestamp {
        value: frame_index as i64 * TIMESTAMP_SCALE,
        timescale: timescale_for_fps(fps),
    }
}

/// The integer timescale corresponding to a frame rate, if one exists.
///
/// Returns `None` when `round(fps × K)` falls outside `1..=i32::MAX`: rates
/// above ~2147 fps would silently saturate the cast, and rates below
/// ~5e-7 fps would round the timescale to zero. Callers that accept a frame
/// rate from the outside ([`crate::EncodeSink::open`]) go through here and
/// turn `None` into an error.
pub fn checked_timescale_for_fps(fps: f64) -> Option<i32> {
    if !(fps > 0.0) {
        return None;
    }
    let scaled = (fps * TIMESTAMP_SCALE as f64).round();
    if (1.0..=i32::MAX as f64).contains(&scaled) {
        Some(scaled as i32)
    } else {
        None
    }
}

/// The integer timescale corresponding to a frame rate.
///
/// This is the denominator shared by every timestamp of a sequence encoded
/// at `fps`, and the encoder's time base is `1 / timescale_for_fps(fps)`.
///
/// # Panics
///
/// `fps` must have a representable timescale; callers validate external
/// rates through [`checked_timescale_for_fps`] first.
pub fn timescale_for_fps(fps: f64) -> i32 {
    match checked_timescale_for_fps(fps) {
        Some(timescale) => timescale,
        None => panic!("frame rate {fps} has no representable timescale"),
    }
}

/// Map a timestamp back to a frame index.
///
/// Used for bounds checking only; the forward mapping is authoritative.
pub fn frame_for_timestamp(timestamp: Timestamp, fps: f64) -> u64 {
    assert!(fps > 0.0, "frame rate must be positive, got {fps}");
    let seconds = timestamp.seconds();
    (seconds * fps).round() as u64
}

/// Convert a frame index to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input.seek()` with `stream_index = -1` expects AV_TIME_BASE units, not
/// the stream time base.
pub(crate) fn frame_to_seek_timestamp(frame_index: u64, fps: f64) -> i64 {
    let seconds = frame_index as f64 / fps;
    (seconds * 1_000_000.0) as i64
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value in a stream time base to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, fps: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base);
    (seconds * fps).round() as u64
}
