//! Ray / map intersection.
//!
//! [`RayMapIntersector`] answers "where would this bearing hit a wall if the
//! sensor stood at this pose": the predicted range used by global scoring
//! and the wall edge used for point-to-line correspondences.
//!
//! Culling runs coarse to fine: area bounding-box slab test, then per-edge
//! side-of-ray and behind-origin tests, then the exact segment intersection.
//!
//! Tie rule: when a wall edge and a passage edge are hit at the same range
//! (within `tie_epsilon`, e.g. a ray grazing a door jamb vertex), the wall
//! wins and the ray stops in the current area.

mod config;
mod ray;

pub use config::IntersectConfig;
pub use ray::{RayHit, RayMapIntersector};
