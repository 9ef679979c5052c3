//! Parallel bar measurement.
//!
//! Spreads [`measure`](crate::measure) across the rayon thread pool. Each
//! frame is measured independently with no shared state; rayon's indexed
//! `collect` puts results back in input order, which the tracker depends on.
//!
//! The public entry point is [`measure_batch`](crate::measure_batch); this
//! module contains only the internal implementation.

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::configuration::DetectorConfig;
use crate::error::BarcutError;
use crate::frame::Frame;
use crate::geometry::{BarGeometry, measure};

/// Number of sampled frames pulled from the source before measuring them as
/// one parallel batch.
pub(crate) const MEASURE_WINDOW: usize = 32;

pub(crate) fn measure_parallel(
    frames: &[Frame],
    config: &DetectorConfig,
) -> Result<Vec<BarGeometry>, BarcutError> {
    frames
        .par_iter()
        .map(|frame| measure(frame, config))
        .collect()
}
