//! Black bar measurement.
//!
//! [`measure`] looks at one [`Frame`] and reports how thick the black bars
//! are on each of its four edges. It is a pure function of the frame and the
//! [`DetectorConfig`], so frames may be measured in any order or in parallel
//! (see [`measure_batch`]) as long as the results reach the
//! [`BarStateTracker`](crate::BarStateTracker) in frame order.

use crate::configuration::DetectorConfig;
use crate::error::BarcutError;
use crate::frame::Frame;

/// Fraction of a row or column that must be at or below the black threshold
/// for the whole line to count as bar.
///
/// A handful of stray bright pixels (logos bleeding into the bar, encoder
/// ringing along the picture edge) should not end a bar, so this is a
/// majority rather than every pixel.
pub const BAR_LINE_BLACK_FRACTION: f64 = 0.95;

/// Bar thickness on each edge of one frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BarGeometry {
    /// Letterbox bar along the top edge.
    pub top: u32,
    /// Letterbox bar along the bottom edge.
    pub bottom: u32,
    /// Pillarbox bar along the left edge.
    pub left: u32,
    /// Pillarbox bar along the right edge.
    pub right: u32,
    /// `true` when at least one edge is `min_bar_size` pixels or thicker.
    pub has_bars: bool,
    /// Minimum thickness an edge needs to count as a bar.
    pub min_bar_size: u32,
}

impl BarGeometry {
    /// Build a geometry, deriving `has_bars` from `min_bar_size`.
    pub fn new(top: u32, bottom: u32, left: u32, right: u32, min_bar_size: u32) -> Self {
        let thickest = top.max(bottom).max(left).max(right);
        Self {
            top,
            bottom,
            left,
            right,
            has_bars: thickest >= min_bar_size,
            min_bar_size,
        }
    }

    /// Copy of this geometry with every edge thinner than `min_bar_size`
    /// set to zero.
    ///
    /// Measured thicknesses keep thin dark strips so the tracker sees the raw
    /// signal; cropping only removes edges that are real bars.
    pub fn significant_bars(&self) -> BarGeometry {
        let keep = |edge: u32| if edge >= self.min_bar_size { edge } else { 0 };
        BarGeometry::new(
            keep(self.top),
            keep(self.bottom),
            keep(self.left),
            keep(self.right),
            self.min_bar_size,
        )
    }

    /// The largest thickness across all four edges.
    pub fn max_thickness(&self) -> u32 {
        self.top.max(self.bottom).max(self.left).max(self.right)
    }

    /// The largest per-edge absolute difference to `other`.
    pub fn max_edge_difference(&self, other: &BarGeometry) -> u32 {
        self.top
            .abs_diff(other.top)
            .max(self.bottom.abs_diff(other.bottom))
            .max(self.left.abs_diff(other.left))
            .max(self.right.abs_diff(other.right))
    }
}

/// Measure the black bars of a single frame.
///
/// Each edge is scanned line by line from the border inward. A line is bar
/// when at least [`BAR_LINE_BLACK_FRACTION`] of its pixels are no brighter
/// than `config.black_threshold`; the edge's thickness is the number of
/// consecutive bar lines. Scanning stops at the midpoint so the top and
/// bottom (or left and right) bars never overlap, which caps each thickness
/// at half the frame dimension.
///
/// # Errors
///
/// Returns [`BarcutError::InvalidFrame`] if the frame has zero width or height.
///
/// # Example
///
/// ```
/// use barcut::{DetectorConfig, Frame, measure};
/// use image::{GrayImage, Luma};
///
/// // 40x40 frame: 8 black rows on top, the rest mid-grey.
/// let image = GrayImage::from_fn(40, 40, |_, y| if y < 8 { Luma([0]) } else { Luma([128]) });
/// let geometry = measure(&Frame::new(image, 0, 25.0), &DetectorConfig::default())?;
///
/// assert_eq!(geometry.top, 8);
/// assert_eq!(geometry.bottom, 0);
/// assert!(!geometry.has_bars); // below the default minimum of 10
/// # Ok::<(), barcut::BarcutError>(())
/// ```
pub fn measure(frame: &Frame, config: &DetectorConfig) -> Result<BarGeometry, BarcutError> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    if width == 0 || height == 0 {
        return Err(BarcutError::InvalidFrame {
            frame_number: frame.index(),
            reason: format!("frame has no pixels ({width}x{height})"),
        });
    }

    let pixels = frame.luma().as_raw();
    let threshold = config.black_threshold;

    let row_is_bar = |y: usize| {
        let row = &pixels[y * width..(y + 1) * width];
        is_bar_line(row.iter().copied(), width, threshold)
    };
    let column_is_bar =
        |x: usize| is_bar_line((0..height).map(|y| pixels[y * width + x]), height, threshold);

    let half_height = height / 2;
    let half_width = width / 2;

    let top = count_from_edge(0..half_height, row_is_bar);
    let bottom = count_from_edge((height - half_height..height).rev(), row_is_bar);
    let left = count_from_edge(0..half_width, column_is_bar);
    let right = count_from_edge((width - half_width..width).rev(), column_is_bar);

    Ok(BarGeometry::new(top, bottom, left, right, config.min_bar_size))
}

/// Measure a slice of frames, returning geometries in the same order.
///
/// With the `rayon` feature enabled the frames are measured on the rayon
/// thread pool; otherwise sequentially. Either way `result[i]` belongs to
/// `frames[i]`.
///
/// # Errors
///
/// Returns the first [`BarcutError::InvalidFrame`] encountered.
pub fn measure_batch(
    frames: &[Frame],
    config: &DetectorConfig,
) -> Result<Vec<BarGeometry>, BarcutError> {
    #[cfg(feature = "rayon")]
    {
        crate::parallel::measure_parallel(frames, config)
    }

    #[cfg(not(feature = "rayon"))]
    {
        frames.iter().map(|frame| measure(frame, config)).collect()
    }
}

fn is_bar_line(line: impl Iterator<Item = u8>, length: usize, threshold: u8) -> bool {
    let black = line.filter(|&value| value <= threshold).count();
    black as f64 >= BAR_LINE_BLACK_FRACTION * length as f64
}

fn count_from_edge(lines: impl Iterator<Item = usize>, is_bar: impl Fn(usize) -> bool) -> u32 {
    lines.take_while(|&line| is_bar(line)).count() as u32
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    fn frame_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Frame {
        Frame::new(GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])), 0, 25.0)
    }

    #[test]
    fn letterbox_and_pillarbox() {
        let frame = frame_from_fn(100, 60, |x, y| {
            if y < 12 || y >= 60 - 7 || x < 15 || x >= 100 - 20 {
                5
            } else {
                200
            }
        });
        let geometry = measure(&frame, &DetectorConfig::default()).unwrap();
        assert_eq!(
            (geometry.top, geometry.bottom, geometry.left, geometry.right),
            (12, 7, 15, 20)
        );
        assert!(geometry.has_bars);
    }

    #[test]
    fn stray_bright_pixels_do_not_end_a_bar() {
        // One bright pixel per 100-pixel row keeps 99% of the row black.
        let frame = frame_from_fn(100, 40, |x, y| if y < 10 && x != 50 { 0 } else { 255 });
        let geometry = measure(&frame, &DetectorConfig::default()).unwrap();
        assert_eq!(geometry.top, 10);
    }

    #[test]
    fn mostly_bright_row_is_not_bar() {
        // 10% bright pixels pushes the row under the majority fraction.
        let frame = frame_from_fn(100, 40, |x, y| if y < 10 && x >= 10 { 0 } else { 255 });
        let geometry = measure(&frame, &DetectorConfig::default()).unwrap();
        assert_eq!(geometry.top, 0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = DetectorConfig::default().with_black_threshold(30);
        let frame = frame_from_fn(20, 20, |_, y| if y < 4 { 30 } else { 31 });
        assert_eq!(measure(&frame, &config).unwrap().top, 4);
    }

    #[test]
    fn odd_dimensions_split_at_midpoint() {
        let frame = frame_from_fn(7, 5, |_, _| 0);
        let geometry = measure(&frame, &DetectorConfig::default().with_min_bar_size(1)).unwrap();
        assert_eq!((geometry.top, geometry.bottom), (2, 2));
        assert_eq!((geometry.left, geometry.right), (3, 3));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = Frame::new(GrayImage::new(0, 10), 7, 25.0);
        match measure(&frame, &DetectorConfig::default()) {
            Err(BarcutError::InvalidFrame { frame_number, .. }) => assert_eq!(frame_number, 7),
            other => panic!("expected InvalidFrame, got {other:?}"),
        }
    }

    #[test]
    fn edge_difference() {
        let a = BarGeometry::new(20, 20, 0, 0, 10);
        let b = BarGeometry::new(17, 21, 0, 6, 10);
        assert_eq!(a.max_edge_difference(&b), 6);
        assert_eq!(b.max_thickness(), 21);
    }

    #[test]
    fn significant_bars_drop_thin_edges() {
        let geometry = BarGeometry::new(14, 3, 9, 10, 10).significant_bars();
        assert_eq!(
            (geometry.top, geometry.bottom, geometry.left, geometry.right),
            (14, 0, 0, 10)
        );
        assert!(geometry.has_bars);
        assert!(!BarGeometry::new(3, 0, 0, 0, 10).significant_bars().has_bars);
    }
}
