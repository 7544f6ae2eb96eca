use std::{fs, path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use videoframes::{
    AssetHandle, ExtractOptions, FfmpegLogLevel, ImageFormat, ProgressCallback, ProgressInfo,
};

const CLI_AFTER_HELP: &str = "Examples:\n  video-to-frames input.mov frames/\n  video-to-frames input.mp4 frames/ --format png --force\n  video-to-frames input.mov frames/ --format jpg --quality 0.9 --base shot";

#[derive(Debug, Parser)]
#[command(
    name = "video-to-frames",
    version,
    about = "Extract every frame of a video as an image sequence",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video path.
    video: PathBuf,

    /// Output directory for the extracted frame images.
    folder: PathBuf,

    /// Output image format (png, jpg, tiff).
    #[arg(long, default_value = "jpg")]
    format: String,

    /// JPEG quality in 0.0..=1.0; ignored for other formats.
    #[arg(long, default_value_t = 0.8)]
    quality: f32,

    /// Base name for frame files; defaults to the video file stem.
    #[arg(long)]
    base: Option<String>,

    /// Allow writing into an existing output directory.
    #[arg(long)]
    force: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn base_name(cli: &Cli) -> String {
    cli.base.clone().unwrap_or_else(|| {
        cli.video
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string())
    })
}

/// Mirrors pipeline progress onto an indicatif bar.
struct BarProgress(ProgressBar);

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.set_position(info.current);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(level) = &cli.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        videoframes::set_ffmpeg_log_level(parsed);
    }

    let format = ImageFormat::from_name(&cli.format, cli.quality)?;

    if cli.folder.exists() && !cli.force {
        return Err(format!(
            "output directory already exists: {} (use --force)",
            cli.folder.display()
        )
        .into());
    }
    fs::create_dir_all(&cli.folder)?;

    let asset = AssetHandle::open(&cli.video)?;
    let info = asset.info().clone();
    log::info!(
        "extracting {} frame(s) at {:.3} fps from {}",
        info.frame_count(),
        info.fps,
        cli.video.display()
    );

    let progress_bar = ProgressBar::new(info.frame_count());
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let options =
        ExtractOptions::new().with_progress(Arc::new(BarProgress(progress_bar.clone())));

    let base = base_name(&cli);
    let folder = cli.folder.clone();
    let mut saved = 0_u64;

    asset.frames()?.for_each_frame(&options, |frame_index, image| {
        let path = folder.join(videoframes::frame_file_name(&base, frame_index, format));
        videoframes::save_frame(&image, &path, format)?;
        saved += 1;
        Ok(())
    })?;

    progress_bar.finish_with_message("done");
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("Extracted {saved} frame(s) to {}", cli.folder.display()).green()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, base_name, parse_log_level};

    #[test]
    fn defaults_are_jpg_at_point_eight() {
        let cli = Cli::parse_from(["video-to-frames", "input.mov", "frames"]);
        assert_eq!(cli.format, "jpg");
        assert_eq!(cli.quality, 0.8);
        assert!(!cli.force);
    }

    #[test]
    fn base_defaults_to_video_stem() {
        let cli = Cli::parse_from(["video-to-frames", "clips/input.mov", "frames"]);
        assert_eq!(base_name(&cli), "input");

        let cli = Cli::parse_from([
            "video-to-frames",
            "clips/input.mov",
            "frames",
            "--base",
            "shot",
        ]);
        assert_eq!(base_name(&cli), "shot");
    }

    #[test]
    fn log_level_aliases() {
        assert!(parse_log_level("warn").is_some());
        assert!(parse_log_level("TRACE").is_some());
        assert!(parse_log_level("loud").is_none());
    }
}
