//! Cut inference.
//!
//! [`CutDetector`] drives a [`FrameSource`], measures every sampled frame
//! with [`measure`](crate::measure), debounces the result through a
//! [`BarStateTracker`], and emits a [`Cut`] wherever the bar geometry
//! genuinely changes.
//!
//! # Example
//!
//! ```no_run
//! use barcut::{AnalysisOptions, CutDetector, DetectorConfig, VideoSource};
//!
//! let detector = CutDetector::new(DetectorConfig::default().with_sample_rate(2))?;
//! let mut source = VideoSource::open("compilation.mp4")?;
//! let cuts = detector.detect(&mut source, &AnalysisOptions::new())?;
//!
//! for cut in &cuts {
//!     println!("cut at frame {} ({:.3}s)", cut.frame_number, cut.timestamp);
//! }
//! # Ok::<(), barcut::BarcutError>(())
//! ```

use std::path::Path;

use crate::{
    configuration::{AnalysisOptions, DetectorConfig},
    conversion::frame_index_to_seconds,
    error::BarcutError,
    frame::Frame,
    geometry::{BarGeometry, measure_batch},
    progress::{OperationType, ProgressTracker},
    source::{FrameSource, MemorySource, VideoSource},
    tracker::BarStateTracker,
};

#[cfg(feature = "rayon")]
use crate::parallel::MEASURE_WINDOW;

#[cfg(not(feature = "rayon"))]
const MEASURE_WINDOW: usize = 1;

/// Geometry on either side of a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarTransition {
    /// Last stable geometry before the cut.
    pub before: BarGeometry,
    /// Geometry measured at the cut.
    pub after: BarGeometry,
}

/// A detected shot boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    /// Sampled frame at which the change was detected. With a sample rate
    /// above 1 this can trail the true transition by up to
    /// `sample_rate - 1` frames.
    pub frame_number: u64,
    /// `frame_number / frame rate`, in seconds.
    pub timestamp: f64,
    /// The bar geometry change that triggered the cut.
    pub transition: BarTransition,
}

/// Cut inference engine.
///
/// A detector holds only its configuration; every call to
/// [`detect`](CutDetector::detect) uses a fresh tracker, so one detector can
/// analyze several videos, including from different threads.
#[derive(Debug, Clone)]
pub struct CutDetector {
    config: DetectorConfig,
}

impl CutDetector {
    /// Create a detector after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BarcutError::InvalidConfig`] for out-of-range settings.
    pub fn new(config: DetectorConfig) -> Result<Self, BarcutError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The detector's configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze `source` and return every cut in frame order.
    ///
    /// Frames `0, sample_rate, 2 * sample_rate, ...` are requested until the
    /// source reports the end of the stream. Progress is reported through
    /// `options` after each sampled frame (subject to the batch size).
    ///
    /// # Errors
    ///
    /// - [`BarcutError::InvalidFrameRate`] if the source has no positive,
    ///   finite frame rate. No frame is pulled in that case.
    /// - [`BarcutError::FrameSource`] if the source fails; it carries the last
    ///   frame that was fully processed.
    /// - [`BarcutError::InvalidFrame`] if a frame cannot be measured.
    pub fn detect<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        options: &AnalysisOptions,
    ) -> Result<Vec<Cut>, BarcutError> {
        let sample_rate = self.config.sample_rate;
        let frame_rate = source.frame_rate();
        let total_frames = source.frame_count();

        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(BarcutError::InvalidFrameRate(frame_rate));
        }

        log::debug!(
            "Detecting cuts ({} frames @ {:.3} fps, threshold={}, min_bar={}, tolerance={}, sample_rate={})",
            total_frames,
            frame_rate,
            self.config.black_threshold,
            self.config.min_bar_size,
            self.config.tolerance,
            sample_rate,
        );

        let mut tracker = BarStateTracker::new(self.config.tolerance);
        let mut progress = ProgressTracker::new(
            options.progress.clone(),
            OperationType::Analysis,
            Some(total_frames),
            options.batch_size,
        );

        let mut cuts = Vec::new();
        let mut last_processed: Option<u64> = None;
        let mut frames_analyzed: u64 = 0;
        let mut next_index: u64 = 0;
        let mut window: Vec<Frame> = Vec::with_capacity(MEASURE_WINDOW);

        loop {
            // Pull up to one window of sampled frames. A source failure is
            // held back until the frames already pulled have been processed.
            let mut source_error = None;
            let mut exhausted = false;
            while window.len() < MEASURE_WINDOW {
                match source.get_frame(next_index) {
                    Ok(Some(frame)) => {
                        window.push(frame);
                        next_index = next_index.saturating_add(sample_rate);
                    }
                    Ok(None) => {
                        exhausted = true;
                        break;
                    }
                    Err(error) => {
                        source_error = Some(error);
                        break;
                    }
                }
            }

            let geometries = measure_batch(&window, &self.config)?;

            for (frame, geometry) in window.drain(..).zip(geometries) {
                let frame_number = frame.index();
                let before = tracker.state().map(|state| state.geometry);
                let (_, changed) = tracker.update(geometry, frame_number)?;

                if changed && let Some(before) = before {
                    let cut = Cut {
                        frame_number,
                        timestamp: frame_index_to_seconds(frame_number, frame_rate),
                        transition: BarTransition {
                            before,
                            after: geometry,
                        },
                    };
                    log::debug!(
                        "Cut at frame {} ({:.3}s): {:?} -> {:?}",
                        cut.frame_number,
                        cut.timestamp,
                        before,
                        geometry
                    );
                    cuts.push(cut);
                }

                last_processed = Some(frame_number);
                frames_analyzed += 1;
                progress.advance_to(frame_number);
            }

            if let Some(error) = source_error {
                log::warn!(
                    "Frame source failed after frame {:?}: {}",
                    last_processed,
                    error
                );
                return Err(BarcutError::FrameSource {
                    last_processed,
                    frames_analyzed,
                    reason: error.to_string(),
                });
            }

            if exhausted {
                break;
            }
        }

        progress.finish();

        log::info!(
            "Analyzed {} sampled frames, detected {} cuts",
            frames_analyzed,
            cuts.len()
        );

        Ok(cuts)
    }

    /// Analyze in-memory grayscale frames.
    ///
    /// Convenience wrapper around [`detect`](CutDetector::detect) with a
    /// [`MemorySource`].
    ///
    /// # Errors
    ///
    /// Same as [`detect`](CutDetector::detect).
    pub fn detect_frames(
        &self,
        images: Vec<image::GrayImage>,
        frames_per_second: f64,
        options: &AnalysisOptions,
    ) -> Result<Vec<Cut>, BarcutError> {
        let mut source = MemorySource::new(images, frames_per_second);
        self.detect(&mut source, options)
    }
}

/// Open `path`, analyze it, and release the decoder.
///
/// # Errors
///
/// - [`BarcutError::InvalidConfig`] before the file is touched.
/// - Any error from [`VideoSource::open`] or [`CutDetector::detect`].
///
/// # Example
///
/// ```no_run
/// use barcut::{AnalysisOptions, DetectorConfig};
///
/// let cuts = barcut::analyze_video("input.mp4", &DetectorConfig::default(), &AnalysisOptions::new())?;
/// println!("{} cuts", cuts.len());
/// # Ok::<(), barcut::BarcutError>(())
/// ```
pub fn analyze_video<P: AsRef<Path>>(
    path: P,
    config: &DetectorConfig,
    options: &AnalysisOptions,
) -> Result<Vec<Cut>, BarcutError> {
    let detector = CutDetector::new(*config)?;
    let mut source = VideoSource::open(path)?;
    detector.detect(&mut source, options)
}
