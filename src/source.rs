//! Frame sources.
//!
//! A [`FrameSource`] hands out grayscale [`Frame`]s in increasing index
//! order. [`VideoSource`] decodes a media file with FFmpeg; [`MemorySource`]
//! serves frames that are already in memory.
//!
//! # Example
//!
//! ```no_run
//! use barcut::{FrameSource, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!("{} frames at {:.2} fps", source.frame_count(), source.frame_rate());
//!
//! // Every 10th frame until the stream ends.
//! let mut index = 0;
//! while let Some(frame) = source.get_frame(index)? {
//!     println!("frame {} at {:.3}s", frame.index(), frame.timestamp());
//!     index += 10;
//! }
//! # Ok::<(), barcut::BarcutError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    error::EAGAIN,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{error::BarcutError, frame::Frame, metadata::VideoMetadata};

/// Sequential supplier of frames.
///
/// Callers request frames by index in strictly increasing order; a source
/// may skip over the frames in between without converting them.
pub trait FrameSource {
    /// Total number of frames. May be an estimate for container-reported
    /// counts; use it for progress, not for loop bounds.
    fn frame_count(&self) -> u64;

    /// Frames per second used to map indices to timestamps.
    fn frame_rate(&self) -> f64;

    /// Fetch the frame at `index`.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Decode or I/O failures are returned as-is; the analysis engine wraps
    /// them into [`BarcutError::FrameSource`].
    fn get_frame(&mut self, index: u64) -> Result<Option<Frame>, BarcutError>;
}

/// A frame source over frames that are already decoded.
///
/// Frame `i` of the vector is served as index `i`.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<Frame>,
    frames_per_second: f64,
}

impl MemorySource {
    /// Wrap grayscale images, indexing them from zero.
    pub fn new(images: Vec<image::GrayImage>, frames_per_second: f64) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Frame::new(image, index as u64, frames_per_second))
            .collect();
        Self {
            frames,
            frames_per_second,
        }
    }
}

impl FrameSource for MemorySource {
    fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn frame_rate(&self) -> f64 {
        self.frames_per_second
    }

    fn get_frame(&mut self, index: u64) -> Result<Option<Frame>, BarcutError> {
        Ok(usize::try_from(index)
            .ok()
            .and_then(|index| self.frames.get(index))
            .cloned())
    }
}

/// A frame source that decodes a media file with FFmpeg.
///
/// Frames are numbered in decode order starting at zero and converted to
/// GRAY8 at the source resolution. The demuxer and decoder are released when
/// the source is dropped.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    metadata: VideoMetadata,
    file_path: PathBuf,
    /// Index the next decoded frame will receive.
    next_index: u64,
    decoded_frame: VideoFrame,
    gray_frame: VideoFrame,
    eof_sent: bool,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("file_path", &self.file_path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a media file and prepare its best video stream for decoding.
    ///
    /// Initializes FFmpeg (idempotent), locates the video stream and caches
    /// its metadata.
    ///
    /// # Errors
    ///
    /// - [`BarcutError::FileOpen`] if the file cannot be opened or its
    ///   decoder cannot be created.
    /// - [`BarcutError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BarcutError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video source: {}", file_path.display());

        let open_error = |reason: String| BarcutError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(BarcutError::NoVideoStream)?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| open_error(format!("Failed to read video codec parameters: {error}")),
        )?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() != 0 {
            f64::from(frame_rate)
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                f64::from(rate)
            } else {
                0.0
            }
        };
        if frames_per_second <= 0.0 {
            log::warn!(
                "Unknown frame rate for {}; cut detection will refuse this source",
                file_path.display()
            );
        }

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ if frames_per_second > 0.0 => (duration.as_secs_f64() * frames_per_second) as u64,
            _ => 0,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, ~{} frames [{}]",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            metadata,
            file_path,
            next_index: 0,
            decoded_frame: VideoFrame::empty(),
            gray_frame: VideoFrame::empty(),
            eof_sent: false,
        })
    }

    /// Cached stream metadata.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Number of frames decoded so far. Once [`get_frame`](FrameSource::get_frame)
    /// has returned `None` this is the exact frame count of the stream.
    pub fn frames_decoded(&self) -> u64 {
        self.next_index
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Decode the rest of the stream without converting it and return the
    /// exact number of frames it holds.
    ///
    /// Unlike [`frame_count`](FrameSource::frame_count) this does not rely
    /// on the container header.
    ///
    /// # Errors
    ///
    /// Returns any demux or decode failure.
    pub fn count_frames(&mut self) -> Result<u64, BarcutError> {
        while self.decode_next()? {}
        Ok(self.next_index)
    }

    /// Advance the decoder by one frame into `decoded_frame`.
    ///
    /// Returns `false` once the decoder is fully drained.
    fn decode_next(&mut self) -> Result<bool, BarcutError> {
        loop {
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {
                    self.next_index += 1;
                    return Ok(true);
                }
                Err(FfmpegError::Eof) => return Ok(false),
                Err(FfmpegError::Other { errno }) if errno == EAGAIN => {}
                Err(error) => return Err(error.into()),
            }

            if self.eof_sent {
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Convert the current `decoded_frame` to a grayscale [`Frame`].
    ///
    /// The scaler is created lazily from the first decoded frame, and rebuilt
    /// if the decoder changes pixel format or size mid-stream.
    fn convert_current_frame(&mut self, index: u64) -> Result<Frame, BarcutError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != format || input.width != width || input.height != height
        });
        if stale {
            self.scaler = Some(ScalingContext::get(
                format,
                width,
                height,
                Pixel::GRAY8,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
        }

        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.gray_frame)?;
        }

        let buffer = crate::conversion::frame_to_buffer(&self.gray_frame, width, height, 1);
        Frame::from_luma(width, height, buffer, index, self.metadata.frames_per_second).ok_or_else(
            || BarcutError::InvalidFrame {
                frame_number: index,
                reason: "decoded plane does not match frame dimensions".to_string(),
            },
        )
    }
}

impl FrameSource for VideoSource {
    fn frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn frame_rate(&self) -> f64 {
        self.metadata.frames_per_second
    }

    fn get_frame(&mut self, index: u64) -> Result<Option<Frame>, BarcutError> {
        if index < self.next_index {
            return Err(BarcutError::OutOfOrderFrame {
                frame_number: index,
                previous: self.next_index - 1,
            });
        }

        while self.decode_next()? {
            let current = self.next_index - 1;
            if current == index {
                return self.convert_current_frame(current).map(Some);
            }
            // Skipped by the sampling stride: decoded, never converted.
        }
        Ok(None)
    }
}
