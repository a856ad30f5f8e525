//! Frame-to-frame tracking: pose refinement and area bookkeeping.

mod area;
mod config;
mod pose;

pub use area::{AreaTracker, AreaUpdate};
pub use config::{AreaTrackerConfig, TrackingConfig};
pub use pose::{PoseTracker, TrackState, TrackingResult};
