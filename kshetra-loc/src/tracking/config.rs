//! Pose and area tracking configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::matching::RobustKernel;

/// Configuration for [`PoseTracker`](super::PoseTracker).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Iteration budget per refinement. Bounds work deterministically.
    /// Default: 30
    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: usize,

    /// Converged when the translation step is below this (meters)...
    /// Default: 0.001
    #[serde(default = "defaults::translation_epsilon")]
    pub translation_epsilon: f32,

    /// ...and the rotation step is below this (radians).
    /// Default: 0.001
    #[serde(default = "defaults::rotation_epsilon")]
    pub rotation_epsilon: f32,

    /// Initial outlier threshold on |residual| (meters).
    /// Default: 0.5
    #[serde(default = "defaults::outlier_threshold")]
    pub outlier_threshold: f32,

    /// Floor of the decaying outlier threshold (meters).
    /// Default: 0.1
    #[serde(default = "defaults::min_outlier_threshold")]
    pub min_outlier_threshold: f32,

    /// Per-iteration decay factor of the outlier threshold.
    /// Default: 0.8
    #[serde(default = "defaults::outlier_decay")]
    pub outlier_decay: f32,

    /// Levenberg damping on the weight-normalized normal equations.
    /// Default: 0.05
    #[serde(default = "defaults::damping")]
    pub damping: f32,

    /// Fewer inlier correspondences than this aborts refinement.
    /// Default: 15
    #[serde(default = "defaults::min_correspondences")]
    pub min_correspondences: usize,

    /// Consecutive cost increases tolerated before declaring divergence.
    /// Default: 3
    #[serde(default = "defaults::divergence_patience")]
    pub divergence_patience: usize,

    /// Weight floor for grazing returns (|cos incidence| below this is clamped).
    /// Default: 0.2
    #[serde(default = "defaults::min_incidence_weight")]
    pub min_incidence_weight: f32,

    /// Robust kernel applied on top of the hard outlier threshold.
    #[serde(default)]
    pub robust_kernel: RobustKernel,

    /// Residual scale of the confidence score (meters).
    /// Default: 0.05
    #[serde(default = "defaults::confidence_sigma")]
    pub confidence_sigma: f32,

    /// Confidence multiplier when the iteration budget ran out.
    /// Default: 0.5
    #[serde(default = "defaults::unconverged_penalty")]
    pub unconverged_penalty: f32,

    /// Largest translation applied in one iteration (meters).
    /// Default: 0.5
    #[serde(default = "defaults::max_step_translation")]
    pub max_step_translation: f32,

    /// Largest rotation applied in one iteration (radians).
    /// Default: 0.2
    #[serde(default = "defaults::max_step_rotation")]
    pub max_step_rotation: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::max_iterations(),
            translation_epsilon: defaults::translation_epsilon(),
            rotation_epsilon: defaults::rotation_epsilon(),
            outlier_threshold: defaults::outlier_threshold(),
            min_outlier_threshold: defaults::min_outlier_threshold(),
            outlier_decay: defaults::outlier_decay(),
            damping: defaults::damping(),
            min_correspondences: defaults::min_correspondences(),
            divergence_patience: defaults::divergence_patience(),
            min_incidence_weight: defaults::min_incidence_weight(),
            robust_kernel: RobustKernel::None,
            confidence_sigma: defaults::confidence_sigma(),
            unconverged_penalty: defaults::unconverged_penalty(),
            max_step_translation: defaults::max_step_translation(),
            max_step_rotation: defaults::max_step_rotation(),
        }
    }
}

impl TrackingConfig {
    /// Builder-style setter for the iteration budget.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Builder-style setter for the robust kernel.
    pub fn with_robust_kernel(mut self, kernel: RobustKernel) -> Self {
        self.robust_kernel = kernel;
        self
    }

    /// Check parameter ranges; returns the offending field on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("tracking.max_iterations".into());
        }
        if !(self.outlier_threshold >= self.min_outlier_threshold && self.min_outlier_threshold > 0.0) {
            return Err("tracking.outlier_threshold/min_outlier_threshold".into());
        }
        if !(self.outlier_decay > 0.0 && self.outlier_decay <= 1.0) {
            return Err("tracking.outlier_decay".into());
        }
        if self.damping < 0.0 {
            return Err("tracking.damping".into());
        }
        if self.divergence_patience == 0 {
            return Err("tracking.divergence_patience".into());
        }
        Ok(())
    }
}

/// Configuration for [`AreaTracker`](super::AreaTracker).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaTrackerConfig {
    /// Passages walked from the current area before giving up.
    /// Default: 2
    #[serde(default = "defaults::max_hops")]
    pub max_hops: usize,
}

impl Default for AreaTrackerConfig {
    fn default() -> Self {
        Self {
            max_hops: defaults::max_hops(),
        }
    }
}
