//! JSON output for detected cuts.
//!
//! The document is an array with one object per cut, in frame order:
//!
//! ```json
//! [
//!   {
//!     "timestamp": 12.5,
//!     "formatted_time": "00:00:12.500",
//!     "frame_number": 300,
//!     "before_state": { "left_width": 0, "right_width": 0, "top_height": 140, "bottom_height": 140 },
//!     "after_state": { "left_width": 240, "right_width": 240, "top_height": 0, "bottom_height": 0 }
//!   }
//! ]
//! ```

use std::{fs, path::Path};

use serde_json::{Value, json};

use crate::{
    conversion::format_timestamp, detector::Cut, error::BarcutError, geometry::BarGeometry,
};

fn geometry_to_json(geometry: &BarGeometry) -> Value {
    json!({
        "left_width": geometry.left,
        "right_width": geometry.right,
        "top_height": geometry.top,
        "bottom_height": geometry.bottom,
    })
}

/// Serialize one cut.
pub fn cut_to_json(cut: &Cut) -> Value {
    json!({
        "timestamp": cut.timestamp,
        "formatted_time": format_timestamp(cut.timestamp),
        "frame_number": cut.frame_number,
        "before_state": geometry_to_json(&cut.transition.before),
        "after_state": geometry_to_json(&cut.transition.after),
    })
}

/// Serialize an ordered cut list.
pub fn cuts_to_json(cuts: &[Cut]) -> Value {
    Value::Array(cuts.iter().map(cut_to_json).collect())
}

/// Write `cuts` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`BarcutError::IoError`] if the file cannot be written.
pub fn save_json<P: AsRef<Path>>(cuts: &[Cut], path: P) -> Result<(), BarcutError> {
    let document = serde_json::to_string_pretty(&cuts_to_json(cuts))?;
    fs::write(path, document)?;
    Ok(())
}
