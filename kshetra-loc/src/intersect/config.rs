//! Ray intersection configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Configuration for [`RayMapIntersector`](super::RayMapIntersector).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IntersectConfig {
    /// Hits farther than this are misses (meters).
    /// Default: 60.0
    #[serde(default = "defaults::ray_max_range")]
    pub max_range: f32,

    /// Maximum passages a single ray may traverse.
    /// Default: 8
    #[serde(default = "defaults::max_passage_hops")]
    pub max_passage_hops: usize,

    /// Two edge hits closer than this are a tie; a wall beats a passage (meters).
    /// Default: 1e-4
    #[serde(default = "defaults::tie_epsilon")]
    pub tie_epsilon: f32,

    /// Batch intersection on the rayon pool.
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub use_parallel: bool,
}

impl Default for IntersectConfig {
    fn default() -> Self {
        Self {
            max_range: defaults::ray_max_range(),
            max_passage_hops: defaults::max_passage_hops(),
            tie_epsilon: defaults::tie_epsilon(),
            use_parallel: true,
        }
    }
}

impl IntersectConfig {
    /// Builder-style setter for the range limit.
    pub fn with_max_range(mut self, meters: f32) -> Self {
        self.max_range = meters;
        self
    }

    /// Builder-style setter for parallel batches.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.use_parallel = enabled;
        self
    }
}
