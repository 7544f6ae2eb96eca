use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use videoframes::{EncodePipeline, EncodeSink, VideoCodec, VideoContainer, VideoFramesError};

const CLI_AFTER_HELP: &str = "Examples:\n  frames-to-video frames/ output.mp4\n  frames-to-video frames/ output.mov --fps 60 --kbps 8000\n  frames-to-video frames/ output.mov --codec prores";

#[derive(Debug, Parser)]
#[command(
    name = "frames-to-video",
    version,
    about = "Encode a folder of image frames into a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Folder containing the frame images, encoded in file-name order.
    folder: PathBuf,

    /// Output video path; the container is chosen from its extension
    /// (.mov or .mp4).
    video: PathBuf,

    /// Output frame rate.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Output bitrate in kilobits per second.
    #[arg(long, default_value_t = 1000)]
    kbps: u32,

    /// Output codec (h264, hevc, prores).
    #[arg(long, default_value = "h264")]
    codec: String,

    /// Allow overwriting an existing output file.
    #[arg(long)]
    force: bool,
}

fn parse_codec(value: &str) -> Option<VideoCodec> {
    match value.to_ascii_lowercase().as_str() {
        "h264" | "avc" => Some(VideoCodec::H264),
        "hevc" | "h265" => Some(VideoCodec::Hevc),
        "prores" => Some(VideoCodec::ProRes),
        _ => None,
    }
}

fn container_for_output(path: &std::path::Path) -> Result<VideoContainer, VideoFramesError> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .and_then(VideoContainer::from_extension)
        .ok_or_else(|| {
            VideoFramesError::UnsupportedFormat(format!(
                "cannot infer container from {} (expected .mov or .mp4)",
                path.display()
            ))
        })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.fps <= 0.0 {
        return Err("--fps must be greater than 0".into());
    }
    if cli.kbps == 0 {
        return Err("--kbps must be greater than 0".into());
    }

    let codec = parse_codec(&cli.codec).ok_or(format!("unsupported --codec: {}", cli.codec))?;
    let container = container_for_output(&cli.video)?;
    if codec == VideoCodec::ProRes && container != VideoContainer::Mov {
        return Err("prores output requires a .mov container".into());
    }

    if cli.video.exists() && !cli.force {
        return Err(format!(
            "output already exists: {} (use --force)",
            cli.video.display()
        )
        .into());
    }

    // Scan before touching the output, so an empty folder fails without
    // leaving a zero-frame file behind.
    let paths = videoframes::collect_frame_paths(&cli.folder)?;
    let first = image::open(&paths[0])?;
    let (width, height) = (first.width(), first.height());
    log::info!(
        "encoding {} frame(s) at {width}x{height}, {:.3} fps, {} kbps",
        paths.len(),
        cli.fps,
        cli.kbps
    );

    let progress_bar = ProgressBar::new(paths.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let producer_bar = progress_bar.clone();
    let output = cli.video.clone();
    let (fps, kbps) = (cli.fps, cli.kbps);

    let encoded = EncodePipeline::new()
        .run(
            move || {
                Ok(paths.into_iter().enumerate().map(move |(index, path)| {
                    let image = image::open(&path).map_err(VideoFramesError::from)?;
                    producer_bar.inc(1);
                    Ok((index as u64, image))
                }))
            },
            move || EncodeSink::open(&output, width, height, fps, kbps, codec, container),
        )
        .await?;

    progress_bar.finish_with_message("done");
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("Encoded {encoded} frame(s) into {}", cli.video.display()).green()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(error) = run().await {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, VideoCodec, VideoContainer, container_for_output, parse_codec};

    #[test]
    fn defaults_are_thirty_fps_at_one_thousand_kbps() {
        let cli = Cli::parse_from(["frames-to-video", "frames", "out.mp4"]);
        assert_eq!(cli.fps, 30.0);
        assert_eq!(cli.kbps, 1000);
        assert_eq!(cli.codec, "h264");
    }

    #[test]
    fn codec_aliases() {
        assert_eq!(parse_codec("H264"), Some(VideoCodec::H264));
        assert_eq!(parse_codec("h265"), Some(VideoCodec::Hevc));
        assert_eq!(parse_codec("prores"), Some(VideoCodec::ProRes));
        assert_eq!(parse_codec("vp9"), None);
    }

    #[test]
    fn container_follows_output_extension() {
        assert_eq!(
            container_for_output("out.MOV".as_ref()).unwrap(),
            VideoContainer::Mov
        );
        assert_eq!(
            container_for_output("out.mp4".as_ref()).unwrap(),
            VideoContainer::Mp4
        );
        assert!(container_for_output("out.avi".as_ref()).is_err());
        assert!(container_for_output("out".as_ref()).is_err());
    }
}
