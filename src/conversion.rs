//! Pixel-data conversion between FFmpeg frames and `image` buffers.
//!
//! FFmpeg planes frequently carry per-row padding (stride > width × bpp);
//! these helpers strip or insert that padding when moving pixels between the
//! two representations.

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
use image::{DynamicImage, RgbImage};

use crate::error::VideoFramesError;

/// Copy an FFmpeg plane into a tightly-packed buffer.
///
/// `bytes_per_pixel` is the packed pixel size of the plane's format
/// (3 for RGB24, 4 for RGBA).
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a scaled RGB24 FFmpeg frame to a [`DynamicImage`].
pub(crate) fn rgb_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, VideoFramesError> {
    let buffer = frame_to_buffer(rgb_frame, width, height, 3);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        VideoFramesError::FrameDecodeFailed(
            "failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Convert a [`DynamicImage`] into an RGBA (32 bpp) FFmpeg frame of the
/// given dimensions, resizing if the source does not match.
///
/// RGBA is the fixed intermediate format the encoder path scales from; the
/// scaler then converts to whatever the codec wants.
pub(crate) fn image_to_rgba_frame(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<VideoFrame, VideoFramesError> {
    let rgba = if image.width() != width || image.height() != height {
        image
            .resize_exact(width, height, image::imageops::FilterType::Lanczos3)
            .to_rgba8()
    } else {
        image.to_rgba8()
    };

    let mut frame = VideoFrame::new(Pixel::RGBA, width, height);
    let stride = frame.stride(0);
    let row_len = (width as usize) * 4;
    let data = frame.data_mut(0);
    let pixels = rgba.as_raw();

    for y in 0..height as usize {
        let src_start = y * row_len;
        let dst_start = y * stride;
        data[dst_start..dst_start + row_len]
            .copy_from_slice(&pixels[src_start..src_start + row_len]);
    }

    Ok(frame)
}
