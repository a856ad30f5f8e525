//! Corridor detection and along-axis observability compensation.
//!
//! - [`OrientationHistogram`]: undirected wall-orientation histogram
//! - [`CorridornessOptimizer`]: per-point weights for pose refinement and
//!   [`CorridorFeedback`] for the next frame's downsampling decision

mod histogram;
mod optimizer;

pub use histogram::OrientationHistogram;
pub use optimizer::{CorridorConfig, CorridorFeedback, CorridorWeights, CorridornessOptimizer};
