//! Core geometric types.
//!
//! - [`Point2D`] and [`Pose2D`]: planar points and rigid poses (REP-103 frame)
//! - [`Bounds`]: axis-aligned boxes used for map extent and ray culling
//! - [`Scan`], [`ScanPoint`], [`ScanIndex`]: organized 3D sweeps
//! - [`math`]: angle helpers

mod bounds;
pub mod math;
mod point;
mod pose;
mod scan;

pub use bounds::Bounds;
pub use math::normalize_angle;
pub use point::Point2D;
pub use pose::Pose2D;
pub use scan::{Scan, ScanIndex, ScanPoint};
