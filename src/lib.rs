//! # barcut
//!
//! Detect cuts in video compilations by watching the black letterbox and
//! pillarbox bars around the picture.
//!
//! Compilations stitched together from differently framed sources change
//! their bar geometry at every clip boundary. `barcut` measures the bars on
//! each sampled frame, debounces the measurements against encoder noise, and
//! reports every frame where the geometry genuinely changes. The resulting
//! cut list can be written as JSON or used to re-encode the video into one
//! file per segment.
//!
//! ## Quick Start
//!
//! ### Find Cuts
//!
//! ```no_run
//! use barcut::{AnalysisOptions, DetectorConfig};
//!
//! let config = DetectorConfig::default().with_tolerance(5);
//! let cuts = barcut::analyze_video("compilation.mp4", &config, &AnalysisOptions::new())?;
//! for cut in &cuts {
//!     println!("{} (frame {})", barcut::format_timestamp(cut.timestamp), cut.frame_number);
//! }
//! # Ok::<(), barcut::BarcutError>(())
//! ```
//!
//! ### Measure a Single Frame
//!
//! ```
//! use barcut::{DetectorConfig, Frame, measure};
//! use image::{GrayImage, Luma};
//!
//! let image = GrayImage::from_fn(64, 64, |_, y| if y < 12 { Luma([0]) } else { Luma([200]) });
//! let geometry = measure(&Frame::new(image, 0, 25.0), &DetectorConfig::default())?;
//! assert_eq!(geometry.top, 12);
//! assert!(geometry.has_bars);
//! # Ok::<(), barcut::BarcutError>(())
//! ```
//!
//! ### Split Into Segments
//!
//! ```no_run
//! use barcut::{AnalysisOptions, DetectorConfig, SegmentSplitter};
//!
//! let cuts = barcut::analyze_video("compilation.mp4", &DetectorConfig::default(), &AnalysisOptions::new())?;
//! SegmentSplitter::new("compilation.mp4", "segments").run(&cuts)?;
//! # Ok::<(), barcut::BarcutError>(())
//! ```
//!
//! ## Pipeline
//!
//! [`FrameSource`] → [`measure`] → [`BarStateTracker`] → [`CutDetector`] →
//! `Vec<`[`Cut`]`>` → JSON ([`report`]) or [`SegmentSplitter`].
//!
//! Only bar measurement is free of sequential state; the tracker must see
//! frames in increasing order.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Measure batches of sampled frames on the rayon thread pool |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build the crate, and the
//! `ffmpeg` executable must be on `PATH` to split videos.

pub mod configuration;
mod conversion;
pub mod detector;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod metadata;
#[cfg(feature = "rayon")]
mod parallel;
pub mod progress;
pub mod report;
pub mod source;
pub mod split;
pub mod tracker;

pub use configuration::{AnalysisOptions, DetectorConfig};
pub use conversion::{format_timestamp, frame_index_to_seconds};
pub use detector::{BarTransition, Cut, CutDetector, analyze_video};
pub use error::BarcutError;
pub use frame::Frame;
pub use geometry::{BAR_LINE_BLACK_FRACTION, BarGeometry, measure, measure_batch};
pub use metadata::VideoMetadata;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use report::{cuts_to_json, save_json};
pub use source::{FrameSource, MemorySource, VideoSource};
pub use split::{Segment, SegmentSplitter, crop_filter, has_ffmpeg, plan_segments};
pub use tracker::{BarState, BarStateTracker};
