//! Detector and analysis configuration.
//!
//! [`DetectorConfig`] holds the numeric knobs of the bar detector.
//! [`AnalysisOptions`] is a builder that threads operational settings
//! (progress reporting) through an analysis run without polluting every
//! function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use barcut::{AnalysisOptions, DetectorConfig, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: frame {}", info.operation, info.current);
//!     }
//! }
//!
//! let config = DetectorConfig::default().with_tolerance(8).with_sample_rate(2);
//! config.validate()?;
//!
//! let options = AnalysisOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_batch_size(100);
//! # Ok::<(), barcut::BarcutError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::BarcutError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Numeric settings for bar measurement and debouncing.
///
/// The defaults suit typical SDR letterboxed compilations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Maximum luminance (0–255) still considered black. Default: 30.
    pub black_threshold: u8,
    /// Minimum thickness in pixels for an edge to count as a bar. Default: 10.
    pub min_bar_size: u32,
    /// Largest per-edge change, in pixels, between consecutive measurements
    /// that is still treated as noise. Default: 5.
    pub tolerance: u32,
    /// Analyze every Nth frame. Default: 1.
    ///
    /// Values above 1 trade precision for speed: a cut is reported at the
    /// first *sampled* frame after the transition, which can be up to
    /// `sample_rate - 1` frames later than the frame where the bars actually
    /// changed.
    pub sample_rate: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            black_threshold: 30,
            min_bar_size: 10,
            tolerance: 5,
            sample_rate: 1,
        }
    }
}

impl DetectorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum intensity considered black.
    #[must_use]
    pub fn with_black_threshold(mut self, threshold: u8) -> Self {
        self.black_threshold = threshold;
        self
    }

    /// Set the minimum bar thickness.
    #[must_use]
    pub fn with_min_bar_size(mut self, size: u32) -> Self {
        self.min_bar_size = size;
        self
    }

    /// Set the debounce tolerance in pixels.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the frame sampling stride.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Check every setting against its accepted range.
    ///
    /// Analysis entry points call this before pulling the first frame.
    ///
    /// # Errors
    ///
    /// Returns [`BarcutError::InvalidConfig`] when `black_threshold` is 255
    /// (every pixel would be black), or when `min_bar_size` or `sample_rate`
    /// is zero.
    pub fn validate(&self) -> Result<(), BarcutError> {
        if self.black_threshold == u8::MAX {
            return Err(BarcutError::InvalidConfig(
                "black threshold must be below 255".to_string(),
            ));
        }
        if self.min_bar_size == 0 {
            return Err(BarcutError::InvalidConfig(
                "minimum bar size must be at least 1 pixel".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(BarcutError::InvalidConfig(
                "sample rate must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Operational settings for an analysis run.
///
/// All fields have defaults: a default-constructed value reports no progress.
#[derive(Clone)]
pub struct AnalysisOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N sampled frames).
    pub(crate) batch_size: u64,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create options with no progress callback and a batch size of 1.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every sampled frame. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }
}
