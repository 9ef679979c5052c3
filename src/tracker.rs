//! Debounced bar state.
//!
//! [`BarStateTracker`] turns the noisy per-frame [`BarGeometry`] stream into
//! a stable [`BarState`] and flags the frames where the geometry genuinely
//! changed. The tolerance comparison is the only noise filter; there is no
//! lookahead, so the tracker must see frames in increasing order.

use crate::error::BarcutError;
use crate::geometry::BarGeometry;

/// The tracker's current view of the bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarState {
    /// Geometry of the most recent measurement.
    pub geometry: BarGeometry,
    /// Consecutive measurements (after the one at `stable_since`) that stayed
    /// within tolerance.
    pub stable_frames: u64,
    /// Frame index at which the current geometry was first seen.
    pub stable_since: u64,
}

impl BarState {
    fn fresh(geometry: BarGeometry, frame_index: u64) -> Self {
        Self {
            geometry,
            stable_frames: 0,
            stable_since: frame_index,
        }
    }
}

/// Sequential debouncer for bar geometry.
///
/// Consecutive measurements whose every edge differs by at most `tolerance`
/// pixels are treated as the same geometry. The stored geometry follows the
/// latest measurement, so the comparison is always between neighbouring
/// sampled frames.
///
/// # Example
///
/// ```
/// use barcut::{BarGeometry, BarStateTracker};
///
/// let mut tracker = BarStateTracker::new(5);
/// let letterbox = BarGeometry::new(20, 20, 0, 0, 10);
/// let full_frame = BarGeometry::new(0, 0, 0, 0, 10);
///
/// assert!(!tracker.update(letterbox, 0)?.1);
/// assert!(!tracker.update(BarGeometry::new(17, 20, 0, 0, 10), 1)?.1);
/// assert!(tracker.update(full_frame, 2)?.1);
/// # Ok::<(), barcut::BarcutError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BarStateTracker {
    tolerance: u32,
    state: Option<BarState>,
    last_frame: Option<u64>,
}

impl BarStateTracker {
    /// Create an empty tracker.
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            state: None,
            last_frame: None,
        }
    }

    /// Feed the geometry measured at `frame_index`.
    ///
    /// Returns the updated state and whether this frame is a genuine change.
    /// The first call only initialises the state and never reports a change.
    ///
    /// # Errors
    ///
    /// Returns [`BarcutError::OutOfOrderFrame`] if `frame_index` is not
    /// greater than the previous one.
    pub fn update(
        &mut self,
        geometry: BarGeometry,
        frame_index: u64,
    ) -> Result<(BarState, bool), BarcutError> {
        if let Some(previous) = self.last_frame
            && frame_index <= previous
        {
            return Err(BarcutError::OutOfOrderFrame {
                frame_number: frame_index,
                previous,
            });
        }
        self.last_frame = Some(frame_index);

        let (state, changed) = match self.state {
            None => (BarState::fresh(geometry, frame_index), false),
            Some(current) if current.geometry.max_edge_difference(&geometry) > self.tolerance => {
                (BarState::fresh(geometry, frame_index), true)
            }
            Some(current) => (
                BarState {
                    geometry,
                    stable_frames: current.stable_frames + 1,
                    stable_since: current.stable_since,
                },
                false,
            ),
        };

        self.state = Some(state);
        Ok((state, changed))
    }

    /// The current state, or `None` before the first update.
    pub fn state(&self) -> Option<&BarState> {
        self.state.as_ref()
    }

    /// The configured tolerance in pixels.
    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Forget all history so the tracker can be reused for another stream.
    pub fn reset(&mut self) {
        self.state = None;
        self.last_frame = None;
    }
}
