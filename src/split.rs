//! Splitting a video into per-cut segments.
//!
//! [`plan_segments`] turns an ordered cut list into contiguous frame spans.
//! [`SegmentSplitter`] re-encodes each span into its own file by running the
//! external `ffmpeg` binary, optionally cropping away the black bars that
//! were measured for that span.
//!
//! # Example
//!
//! ```no_run
//! use barcut::{AnalysisOptions, DetectorConfig, SegmentSplitter};
//!
//! let cuts = barcut::analyze_video("input.mp4", &DetectorConfig::default(), &AnalysisOptions::new())?;
//! let files = SegmentSplitter::new("input.mp4", "segments")
//!     .crop_bars(true)
//!     .run(&cuts)?;
//! println!("wrote {} segments", files.len());
//! # Ok::<(), barcut::BarcutError>(())
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};

use crate::{
    conversion::frame_index_to_seconds,
    detector::Cut,
    error::BarcutError,
    geometry::BarGeometry,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    source::{FrameSource, VideoSource},
};

/// Smallest width or height, in pixels, a cropped segment may have.
pub const MIN_CROPPED_DIMENSION: u32 = 64;

/// One output segment: frames `[start_frame, end_frame)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 1-based position of the segment in the output.
    pub index: usize,
    /// First frame of the segment.
    pub start_frame: u64,
    /// First frame after the segment.
    pub end_frame: u64,
    /// Start time in seconds.
    pub start_time: f64,
    /// Length in seconds.
    pub duration: f64,
    /// Bars measured for this segment, used for cropping. `None` when the
    /// video had no cuts.
    pub bars: Option<BarGeometry>,
}

/// Split `[0, total_frames)` at every cut.
///
/// The first segment takes the geometry from before the first cut; every
/// later segment takes the geometry measured at the cut that opens it. A
/// trailing segment is only produced when the last cut lies before
/// `total_frames`. Without cuts, the whole video becomes one segment.
pub fn plan_segments(cuts: &[Cut], total_frames: u64, frames_per_second: f64) -> Vec<Segment> {
    let mut spans: Vec<(u64, u64, Option<BarGeometry>)> = Vec::with_capacity(cuts.len() + 1);

    match (cuts.first(), cuts.last()) {
        (Some(first), Some(last)) => {
            spans.push((0, first.frame_number, Some(first.transition.before)));
            for pair in cuts.windows(2) {
                spans.push((
                    pair[0].frame_number,
                    pair[1].frame_number,
                    Some(pair[0].transition.after),
                ));
            }
            if last.frame_number < total_frames {
                spans.push((last.frame_number, total_frames, Some(last.transition.after)));
            }
        }
        _ => spans.push((0, total_frames, None)),
    }

    spans
        .into_iter()
        .enumerate()
        .map(|(position, (start_frame, end_frame, bars))| Segment {
            index: position + 1,
            start_frame,
            end_frame,
            start_time: frame_index_to_seconds(start_frame, frames_per_second),
            duration: frame_index_to_seconds(end_frame - start_frame, frames_per_second),
            bars,
        })
        .collect()
}

/// Build an FFmpeg `crop=W:H:X:Y` filter that removes `bars`.
///
/// Only edges at least `bars.min_bar_size` thick are cropped; thinner dark
/// strips are left in the picture. Returns `None` when no edge qualifies, or
/// when the remaining picture would be smaller than [`MIN_CROPPED_DIMENSION`]
/// on either axis.
pub fn crop_filter(bars: &BarGeometry, width: u32, height: u32) -> Option<String> {
    if !bars.has_bars {
        return None;
    }
    let bars = bars.significant_bars();

    let crop_width = width.checked_sub(bars.left)?.checked_sub(bars.right)?;
    let crop_height = height.checked_sub(bars.top)?.checked_sub(bars.bottom)?;

    if crop_width < MIN_CROPPED_DIMENSION || crop_height < MIN_CROPPED_DIMENSION {
        return None;
    }

    Some(format!(
        "crop={crop_width}:{crop_height}:{}:{}",
        bars.left, bars.top
    ))
}

/// Whether an `ffmpeg` executable can be run.
pub fn has_ffmpeg() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Builder for re-encoding a video into per-cut segments.
///
/// Each segment is seeked to (`-ss` before `-i`) and re-encoded with
/// `libx264`/`aac` so boundaries are frame accurate.
pub struct SegmentSplitter {
    input: PathBuf,
    output_dir: PathBuf,
    crop_bars: bool,
    progress: Arc<dyn ProgressCallback>,
}

impl SegmentSplitter {
    /// Split `input` into files under `output_dir`.
    ///
    /// Cropping is enabled by default.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output_dir: Q) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            crop_bars: true,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Crop each segment's measured black bars.
    pub fn crop_bars(mut self, crop: bool) -> Self {
        self.crop_bars = crop;
        self
    }

    /// Report one progress step per finished segment.
    pub fn progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Output path for segment number `index` (1-based).
    pub fn segment_path(&self, index: usize) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.output_dir.join(format!("{stem}_segment_{index:02}.mp4"))
    }

    /// Build the `ffmpeg` arguments for one segment.
    pub fn segment_arguments(&self, segment: &Segment, width: u32, height: u32) -> Vec<String> {
        let mut arguments = vec![
            "-ss".to_string(),
            segment.start_time.to_string(),
            "-i".to_string(),
            self.input.to_string_lossy().into_owned(),
            "-t".to_string(),
            segment.duration.to_string(),
        ];

        if self.crop_bars
            && let Some(filter) = segment
                .bars
                .as_ref()
                .and_then(|bars| crop_filter(bars, width, height))
        {
            arguments.push("-vf".to_string());
            arguments.push(filter);
        }

        arguments.extend(
            [
                "-c:v",
                "libx264",
                "-c:a",
                "aac",
                "-preset",
                "medium",
                "-crf",
                "18",
                "-avoid_negative_ts",
                "make_zero",
                "-fflags",
                "+genpts",
                "-y",
            ]
            .map(String::from),
        );
        arguments.push(self.segment_path(segment.index).to_string_lossy().into_owned());
        arguments
    }

    /// Count the input's frames, plan segments and encode each one.
    ///
    /// The frame count comes from a full decode rather than the container
    /// header, so a trailing segment is never dropped because of an
    /// underestimated count. Returns the created files in segment order.
    ///
    /// # Errors
    ///
    /// - [`BarcutError::TranscoderUnavailable`] if `ffmpeg` is not installed.
    /// - Any error from [`VideoSource::open`] or
    ///   [`VideoSource::count_frames`] while probing the input.
    /// - [`BarcutError::Transcode`] if an `ffmpeg` run fails.
    pub fn run(&self, cuts: &[Cut]) -> Result<Vec<PathBuf>, BarcutError> {
        if !has_ffmpeg() {
            return Err(BarcutError::TranscoderUnavailable);
        }

        let (total_frames, frames_per_second, width, height) = {
            let mut source = VideoSource::open(&self.input)?;
            let estimate = source.frame_count();
            let total_frames = source.count_frames()?;
            if total_frames != estimate {
                log::debug!(
                    "{} holds {} frames (container reported {})",
                    self.input.display(),
                    total_frames,
                    estimate
                );
            }
            let metadata = source.metadata();
            (
                total_frames,
                source.frame_rate(),
                metadata.width,
                metadata.height,
            )
        };

        let segments = plan_segments(cuts, total_frames, frames_per_second);
        self.run_segments(&segments, width, height)
    }

    /// Encode already-planned segments of a `width`x`height` input.
    ///
    /// # Errors
    ///
    /// Same as [`run`](SegmentSplitter::run), minus the probing errors.
    pub fn run_segments(
        &self,
        segments: &[Segment],
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, BarcutError> {
        if !has_ffmpeg() {
            return Err(BarcutError::TranscoderUnavailable);
        }
        fs::create_dir_all(&self.output_dir)?;

        log::info!(
            "Splitting {} into {} segments under {}",
            self.input.display(),
            segments.len(),
            self.output_dir.display()
        );

        let mut progress = ProgressTracker::new(
            self.progress.clone(),
            OperationType::Splitting,
            Some(segments.len() as u64),
            1,
        );
        let mut created = Vec::with_capacity(segments.len());

        for segment in segments {
            let arguments = self.segment_arguments(segment, width, height);
            log::debug!("ffmpeg {}", arguments.join(" "));

            let output = Command::new("ffmpeg")
                .args(&arguments)
                .stdin(Stdio::null())
                .output()
                .map_err(|error| {
                    BarcutError::Transcode(format!("failed to run ffmpeg: {error}"))
                })?;

            if !output.status.success() {
                return Err(BarcutError::Transcode(format!(
                    "ffmpeg failed on segment {} (frames {}..{}): {}",
                    segment.index,
                    segment.start_frame,
                    segment.end_frame,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }

            created.push(self.segment_path(segment.index));
            progress.advance_to(segment.index as u64);
        }

        progress.finish();
        Ok(created)
    }
}
