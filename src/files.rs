//! Frame file naming, saving, and folder scanning.
//!
//! Extraction writes one image file per frame using a fixed naming scheme,
//! `<base>_<index:06>.<ext>`, so a folder of frames sorts back into frame
//! order lexicographically. Encoding scans a folder for image files and
//! feeds them to the pipeline in that order.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::error::VideoFramesError;

/// Image formats supported for extracted frames.
///
/// JPEG carries its quality setting, expressed on the `0.0..=1.0` scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    /// PNG, lossless.
    Png,
    /// JPEG with a quality in `0.0..=1.0`.
    Jpg(f32),
    /// TIFF, lossless.
    Tiff,
}

impl ImageFormat {
    /// Parse a format name as given on the command line.
    ///
    /// `quality` applies to JPEG only and is clamped to `0.0..=1.0`.
    pub fn from_name(name: &str, quality: f32) -> Result<Self, VideoFramesError> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg(quality.clamp(0.0, 1.0))),
            "tiff" | "tif" => Ok(Self::Tiff),
            other => Err(VideoFramesError::UnsupportedFormat(other.to_string())),
        }
    }

    /// File extension for this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg(_) => "jpg",
            Self::Tiff => "tiff",
        }
    }
}

/// File name for a single extracted frame: `<base>_<index:06>.<ext>`.
///
/// Six digits keep names fixed-width (and therefore sortable) for any video
/// shorter than ~four days at 240 fps.
pub fn frame_file_name(base: &str, frame_index: u64, format: ImageFormat) -> String {
    format!("{base}_{frame_index:06}.{}", format.extension())
}

/// Save one frame to `path` in the given format.
///
/// PNG and TIFF go through [`DynamicImage::save_with_format`]; JPEG uses an
/// explicit encoder so the quality setting is honored. The image crate's
/// JPEG quality scale is `1..=100`, so the `0.0..=1.0` setting is mapped
/// onto it (a quality of `0.0` still encodes, at the lowest setting).
pub fn save_frame(
    image: &DynamicImage,
    path: &Path,
    format: ImageFormat,
) -> Result<(), VideoFramesError> {
    match format {
        ImageFormat::Png => image.save_with_format(path, image::ImageFormat::Png)?,
        ImageFormat::Tiff => image.save_with_format(path, image::ImageFormat::Tiff)?,
        ImageFormat::Jpg(quality) => {
            let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(writer, quality);
            image.write_with_encoder(encoder)?;
        }
    }
    Ok(())
}

/// Collect the image files in `folder`, sorted by file name.
///
/// Only files with a `png`, `jpg`, `jpeg`, `tif`, or `tiff` extension
/// (case-insensitive) are considered; everything else in the folder is
/// ignored. Frames written by [`frame_file_name`] sort back into frame
/// order, but any lexicographically ordered set of images works.
///
/// # Errors
///
/// [`VideoFramesError::SourceNotFound`] if `folder` does not exist or is
/// not a directory, [`VideoFramesError::NoFramesFound`] if it contains no
/// image files.
pub fn collect_frame_paths(folder: &Path) -> Result<Vec<PathBuf>, VideoFramesError> {
    if !folder.is_dir() {
        return Err(VideoFramesError::SourceNotFound {
            path: folder.to_path_buf(),
            reason: if folder.exists() {
                "not a directory".to_string()
            } else {
                "no such directory".to_string()
            },
        });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();

    if paths.is_empty() {
        return Err(VideoFramesError::NoFramesFound(folder.to_path_buf()));
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            matches!(
                extension.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "tif" | "tiff"
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_file_names_are_zero_padded() {
        assert_eq!(
            frame_file_name("clip", 0, ImageFormat::Png),
            "clip_000000.png"
        );
        assert_eq!(
            frame_file_name("clip", 441, ImageFormat::Jpg(0.8)),
            "clip_000441.jpg"
        );
        assert_eq!(
            frame_file_name("clip", 1_000_000, ImageFormat::Tiff),
            "clip_1000000.tiff"
        );
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(ImageFormat::from_name("PNG", 0.8).unwrap(), ImageFormat::Png);
        assert_eq!(
            ImageFormat::from_name("jpeg", 0.5).unwrap(),
            ImageFormat::Jpg(0.5)
        );
        assert_eq!(
            ImageFormat::from_name("tif", 0.8).unwrap(),
            ImageFormat::Tiff
        );
        assert!(matches!(
            ImageFormat::from_name("bmp", 0.8),
            Err(VideoFramesError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(
            ImageFormat::from_name("jpg", 1.7).unwrap(),
            ImageFormat::Jpg(1.0)
        );
        assert_eq!(
            ImageFormat::from_name("jpg", -0.2).unwrap(),
            ImageFormat::Jpg(0.0)
        );
    }
}
