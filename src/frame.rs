//! Analyzed video frames.
//!
//! A [`Frame`] is a single sampled instant of the video reduced to 8-bit
//! luminance. Colour input is converted on construction, so the geometry
//! analyzer only ever deals with one intensity channel.

use image::{DynamicImage, GrayImage};

use crate::conversion::frame_index_to_seconds;

/// A grayscale frame together with its position in the stream.
///
/// Frames are created by a [`FrameSource`](crate::FrameSource), measured once,
/// and dropped.
#[derive(Debug, Clone)]
pub struct Frame {
    image: GrayImage,
    index: u64,
    timestamp: f64,
}

impl Frame {
    /// Wrap a grayscale image captured at `index`.
    ///
    /// `timestamp` is derived from `frames_per_second`.
    pub fn new(image: GrayImage, index: u64, frames_per_second: f64) -> Self {
        Self {
            image,
            index,
            timestamp: frame_index_to_seconds(index, frames_per_second),
        }
    }

    /// Build a frame from any decoded image, reducing it to luminance.
    pub fn from_image(image: &DynamicImage, index: u64, frames_per_second: f64) -> Self {
        Self::new(image.to_luma8(), index, frames_per_second)
    }

    /// Build a frame from raw row-major GRAY8 bytes.
    ///
    /// Returns `None` if `pixels` does not hold exactly `width * height` bytes.
    pub fn from_luma(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        index: u64,
        frames_per_second: f64,
    ) -> Option<Self> {
        GrayImage::from_raw(width, height, pixels)
            .map(|image| Self::new(image, index, frames_per_second))
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Zero-based index of this frame in the stream.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Presentation time in seconds (`index / frame rate`).
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// The luminance plane.
    pub fn luma(&self) -> &GrayImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn timestamp_follows_frame_rate() {
        let frame = Frame::new(GrayImage::new(4, 4), 30, 24.0);
        assert_eq!(frame.index(), 30);
        assert!((frame.timestamp() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn colour_input_is_reduced_to_luma() {
        let rgb = RgbImage::from_pixel(8, 6, Rgb([255, 255, 255]));
        let frame = Frame::from_image(&DynamicImage::ImageRgb8(rgb), 0, 25.0);
        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert!(frame.luma().pixels().all(|pixel| pixel.0[0] == 255));
    }

    #[test]
    fn raw_buffer_must_match_dimensions() {
        assert!(Frame::from_luma(4, 4, vec![0; 16], 0, 25.0).is_some());
        assert!(Frame::from_luma(4, 4, vec![0; 15], 0, 25.0).is_none());
    }
}
