//! # videoframes
//!
//! Convert videos to still-frame sequences and still-frame sequences back
//! to videos.
//!
//! `videoframes` extracts frames from a video as [`image::DynamicImage`]
//! values and encodes ordered image sequences into H.264, HEVC, or ProRes
//! video, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract a Single Frame
//!
//! ```no_run
//! use videoframes::AssetHandle;
//!
//! let mut asset = AssetHandle::open("input.mp4").unwrap();
//! let frame = asset.extract_frame(100).unwrap();
//! frame.save("frame_100.png").unwrap();
//! ```
//!
//! ### Stream All Frames
//!
//! ```no_run
//! use videoframes::{AssetHandle, ExtractOptions};
//!
//! let asset = AssetHandle::open("input.mp4").unwrap();
//! let source = asset.frames().unwrap();
//! source
//!     .for_each_frame(&ExtractOptions::default(), |frame_index, image| {
//!         image.save(format!("frame_{frame_index:06}.png"))?;
//!         Ok(())
//!     })
//!     .unwrap();
//! ```
//!
//! ### Encode Frames into a Video
//!
//! ```no_run
//! use videoframes::{
//!     EncodePipeline, EncodeSink, VideoCodec, VideoContainer, VideoFramesError,
//! };
//!
//! # async fn example() -> Result<(), VideoFramesError> {
//! let paths = videoframes::collect_frame_paths("frames/".as_ref())?;
//! let first = image::open(&paths[0])?;
//! let (width, height) = (first.width(), first.height());
//!
//! let encoded = EncodePipeline::new()
//!     .run(
//!         move || {
//!             Ok(paths.into_iter().enumerate().map(|(index, path)| {
//!                 Ok((index as u64, image::open(path)?))
//!             }))
//!         },
//!         move || {
//!             EncodeSink::open(
//!                 "output.mp4", width, height, 30.0, 1000,
//!                 VideoCodec::H264, VideoContainer::Mp4,
//!             )
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Frame extraction** — a single frame by index, or the whole video as
//!   a lazy iterator / push-based visitor
//! - **Video encoding** — H.264 and HEVC into MP4 or MOV, ProRes into MOV,
//!   with configurable frame rate and bitrate
//! - **Drift-free timing** — frame⇄timestamp mapping uses exact rational
//!   arithmetic, stable across hours of footage
//! - **Concurrent pipeline** — decode and encode overlap on blocking
//!   worker threads with bounded buffering
//! - **Progress & cancellation** — cooperative callbacks and
//!   `CancellationToken` for long-running operations
//! - **Frame files** — deterministic `<base>_<index:06>.<ext>` naming and
//!   sorted folder scanning for PNG, JPEG, and TIFF
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod asset;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod files;
pub mod info;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod source;
pub mod timing;

pub use asset::AssetHandle;
pub use error::VideoFramesError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use files::{ImageFormat, collect_frame_paths, frame_file_name, save_frame};
pub use info::{MAX_FRAME_RATE, VideoInfo};
pub use options::ExtractOptions;
pub use pipeline::EncodePipeline;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sink::{EncodeSink, FrameSink, VideoCodec, VideoContainer};
pub use source::FrameSource;
pub use timing::{TIMESTAMP_SCALE, Timestamp, timestamp_for_frame};
