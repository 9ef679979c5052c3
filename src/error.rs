//! Error types for the `barcut` crate.
//!
//! This module defines [`BarcutError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry the context needed to act on
//! them, most importantly the frame index at which analysis stopped.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `barcut` operations.
///
/// Every public method that can fail returns `Result<T, BarcutError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BarcutError {
    /// A frame could not be measured (zero width or height, or a buffer that
    /// does not match its dimensions).
    #[error("Invalid frame {frame_number}: {reason}")]
    InvalidFrame {
        /// Index of the offending frame.
        frame_number: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// A detector setting is outside its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The frame provider failed mid-stream.
    ///
    /// `last_processed` is the index of the last frame that made it through
    /// the tracker (`None` if the very first frame failed), so callers can
    /// report partial progress.
    #[error(
        "Frame source failed after {frames_analyzed} analyzed frames (last processed: {}): {reason}",
        describe_index(.last_processed)
    )]
    FrameSource {
        /// Last frame index successfully fed through the tracker.
        last_processed: Option<u64>,
        /// Number of sampled frames analyzed before the failure.
        frames_analyzed: u64,
        /// Underlying decode or I/O failure.
        reason: String,
    },

    /// The source reports no usable frame rate, so cut timestamps cannot be
    /// derived from frame indices.
    #[error("Invalid frame rate {0}: timestamps cannot be computed")]
    InvalidFrameRate(f64),

    /// The tracker received a frame index that does not follow the previous one.
    #[error("Frame {frame_number} arrived out of order (previous frame was {previous})")]
    OutOfOrderFrame {
        /// The frame index that was offered.
        frame_number: u64,
        /// The last frame index the tracker accepted.
        previous: u64,
    },

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The external transcoder exited unsuccessfully.
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// The `ffmpeg` binary could not be found on `PATH`.
    #[error("ffmpeg executable not found; install FFmpeg to split videos")]
    TranscoderUnavailable,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// Results could not be serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),
}

impl From<FfmpegError> for BarcutError {
    fn from(error: FfmpegError) -> Self {
        BarcutError::FfmpegError(error.to_string())
    }
}

fn describe_index(index: &Option<u64>) -> String {
    index.map_or_else(|| "none".to_string(), |index| index.to_string())
}
