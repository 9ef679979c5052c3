//! Video stream metadata.
//!
//! Extracted once when a [`VideoSource`](crate::VideoSource) is opened and
//! cached for its lifetime.

use std::time::Duration;

/// Metadata for the analyzed video stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames. Taken from the stream header when present,
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Total duration of the container.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}
