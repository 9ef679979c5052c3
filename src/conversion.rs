//! Timestamp and pixel-buffer conversion helpers.
//!
//! Shared logic for mapping frame indices to seconds, formatting timestamps
//! for display, and copying decoded FFmpeg planes into tightly-packed
//! buffers.

use ffmpeg_next::frame::Video as VideoFrame;

/// Convert a frame index to seconds using the stream's frame rate.
///
/// Returns `0.0` when the frame rate is unknown (zero or not finite). Cut
/// detection rejects such sources up front, so this only matters for display.
pub fn frame_index_to_seconds(frame_index: u64, frames_per_second: f64) -> f64 {
    if frames_per_second.is_finite() && frames_per_second > 0.0 {
        frame_index as f64 / frames_per_second
    } else {
        0.0
    }
}

/// Format a number of seconds as `HH:MM:SS.mmm`.
///
/// ```
/// assert_eq!(barcut::format_timestamp(61.5), "00:01:01.500");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Copy the first plane of an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is 1 for GRAY8. Rows are copied individually when the
/// decoder pads its line stride.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
