//! FFmpeg console log control.
//!
//! FFmpeg writes its own diagnostics to stderr, independent of the Rust
//! `log` crate. During batch frame extraction that output can drown the
//! progress display, so this module exposes FFmpeg's verbosity setting
//! without requiring callers to depend on `ffmpeg-next` themselves.
//!
//! ```no_run
//! use videoframes::FfmpegLogLevel;
//!
//! // Keep FFmpeg quiet except for real errors.
//! videoframes::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```
//!
//! Rust-side messages emitted through the `log` crate are unaffected;
//! configure those with `env_logger` (or any other `log` backend) as usual.

use ffmpeg_next::util::log::Level;

/// FFmpeg's internal verbosity, from quietest to most verbose.
///
/// Mirrors FFmpeg's `AV_LOG_*` levels; messages below the chosen severity
/// are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Conditions the process cannot survive.
    Panic,
    /// Unrecoverable errors within a single context.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings. FFmpeg's default.
    Warning,
    /// Informational messages.
    Info,
    /// Chatty informational messages.
    Verbose,
    /// Debugging output.
    Debug,
    /// Everything, including per-packet tracing.
    Trace,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

/// Set FFmpeg's stderr verbosity.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into());
}
