//! Frame file naming, saving, and folder scanning tests.

use image::DynamicImage;
use videoframes::{ImageFormat, VideoFramesError, collect_frame_paths, frame_file_name, save_frame};

fn test_image() -> DynamicImage {
    DynamicImage::new_rgb8(32, 24)
}

#[test]
fn saved_frames_scan_back_in_frame_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = test_image();

    // Write out of order; the scan must come back sorted by name.
    for frame_index in [3_u64, 0, 12, 7] {
        let name = frame_file_name("clip", frame_index, ImageFormat::Png);
        save_frame(&image, &dir.path().join(name), ImageFormat::Png).expect("save");
    }

    let paths = collect_frame_paths(dir.path()).expect("scan");
    let names: Vec<_> = paths
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "clip_000000.png",
            "clip_000003.png",
            "clip_000007.png",
            "clip_000012.png"
        ]
    );
}

#[test]
fn scan_ignores_non_image_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = test_image();

    save_frame(
        &image,
        &dir.path().join("clip_000000.png"),
        ImageFormat::Png,
    )
    .expect("save");
    std::fs::write(dir.path().join("notes.txt"), "not a frame").expect("write");
    std::fs::write(dir.path().join("clip_000001.tmp"), [0_u8; 4]).expect("write");

    let paths = collect_frame_paths(dir.path()).expect("scan");
    assert_eq!(paths.len(), 1);
}

#[test]
fn scan_accepts_mixed_image_extensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = test_image();

    save_frame(&image, &dir.path().join("a.png"), ImageFormat::Png).expect("save png");
    save_frame(&image, &dir.path().join("b.jpg"), ImageFormat::Jpg(0.8)).expect("save jpg");
    save_frame(&image, &dir.path().join("c.tiff"), ImageFormat::Tiff).expect("save tiff");

    let paths = collect_frame_paths(dir.path()).expect("scan");
    assert_eq!(paths.len(), 3);
}

#[test]
fn empty_folder_reports_no_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("readme.md"), "empty").expect("write");

    let result = collect_frame_paths(dir.path());
    assert!(matches!(result, Err(VideoFramesError::NoFramesFound(_))));
}

#[test]
fn missing_folder_reports_source_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("does_not_exist");

    let result = collect_frame_paths(&missing);
    assert!(matches!(
        result,
        Err(VideoFramesError::SourceNotFound { .. })
    ));
}

#[test]
fn file_instead_of_folder_reports_source_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("clip_000000.png");
    save_frame(&test_image(), &file, ImageFormat::Png).expect("save");

    let result = collect_frame_paths(&file);
    assert!(matches!(
        result,
        Err(VideoFramesError::SourceNotFound { .. })
    ));
}

#[test]
fn jpeg_quality_affects_file_size() {
    let dir = tempfile::tempdir().expect("tempdir");

    // A gradient compresses differently at different quality settings;
    // a flat image would not.
    let mut buffer = image::RgbImage::new(128, 128);
    for (x, y, pixel) in buffer.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8]);
    }
    let image = DynamicImage::ImageRgb8(buffer);

    let low = dir.path().join("low.jpg");
    let high = dir.path().join("high.jpg");
    save_frame(&image, &low, ImageFormat::Jpg(0.1)).expect("save low");
    save_frame(&image, &high, ImageFormat::Jpg(0.95)).expect("save high");

    let low_size = std::fs::metadata(&low).unwrap().len();
    let high_size = std::fs::metadata(&high).unwrap().len();
    assert!(
        high_size > low_size,
        "expected higher quality to produce more bytes ({high_size} vs {low_size})"
    );
}

#[test]
fn saved_frames_reload_with_same_dimensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(frame_file_name("clip", 0, ImageFormat::Png));

    save_frame(&test_image(), &path, ImageFormat::Png).expect("save");
    let reloaded = image::open(&path).expect("reload");
    assert_eq!(reloaded.width(), 32);
    assert_eq!(reloaded.height(), 24);
}
