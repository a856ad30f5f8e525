//! Corridor-degeneracy compensation for pose refinement.

use serde::{Deserialize, Serialize};

use super::histogram::OrientationHistogram;
use crate::config::defaults;
use crate::core::Pose2D;
use crate::core::math::{deg_to_rad, orientation_diff};
use crate::map::{AreaGraphMap, AreaId};
use crate::preprocess::{ProcessedPoint, ProcessedScan};

/// Configuration for [`CorridornessOptimizer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorridorConfig {
    /// Enable corridor weighting. When false every weight is 1.0.
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Corridorness at which weighting starts (0..1).
    /// Default: 0.6
    #[serde(default = "defaults::corridorness_threshold")]
    pub threshold: f32,

    /// Alignment tolerance to the dominant orientation (degrees).
    /// Default: 15.0
    #[serde(default = "defaults::alignment_tolerance_deg")]
    pub alignment_tolerance_deg: f32,

    /// Half-width of the dominant-orientation window (degrees).
    /// Default: 10.0
    #[serde(default = "defaults::peak_window_deg")]
    pub peak_window_deg: f32,

    /// Histogram resolution over [0, π).
    /// Default: 36
    #[serde(default = "defaults::histogram_bins")]
    pub histogram_bins: usize,

    /// Weight of axis-aligned points at corridorness 1.0.
    /// Default: 0.2
    #[serde(default = "defaults::axis_weight")]
    pub axis_weight: f32,

    /// Target share of total weight carried by cross-axis points.
    /// Default: 0.3
    #[serde(default = "defaults::cross_share")]
    pub cross_share: f32,

    /// Upper bound on a cross-axis point's weight.
    /// Default: 5.0
    #[serde(default = "defaults::max_cross_weight")]
    pub max_cross_weight: f32,

    /// Mass of the area's wall histogram relative to the scan's.
    /// Default: 0.3
    #[serde(default = "defaults::map_histogram_weight")]
    pub map_histogram_weight: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: defaults::corridorness_threshold(),
            alignment_tolerance_deg: defaults::alignment_tolerance_deg(),
            peak_window_deg: defaults::peak_window_deg(),
            histogram_bins: defaults::histogram_bins(),
            axis_weight: defaults::axis_weight(),
            cross_share: defaults::cross_share(),
            max_cross_weight: defaults::max_cross_weight(),
            map_histogram_weight: defaults::map_histogram_weight(),
        }
    }
}

impl CorridorConfig {
    /// Builder-style switch.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check parameter ranges; returns the offending field on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err("corridor.threshold".into());
        }
        if !(0.0..=1.0).contains(&self.axis_weight) {
            return Err("corridor.axis_weight".into());
        }
        if !(0.0..1.0).contains(&self.cross_share) {
            return Err("corridor.cross_share".into());
        }
        if self.max_cross_weight < 1.0 {
            return Err("corridor.max_cross_weight".into());
        }
        if self.histogram_bins == 0 {
            return Err("corridor.histogram_bins".into());
        }
        Ok(())
    }
}

/// Per-point weights for one processed scan.
#[derive(Clone, Debug)]
pub struct CorridorWeights {
    /// One weight per retained point, aligned with `ProcessedScan::points`.
    pub weights: Vec<f32>,
    /// Corridorness after merging the area's wall histogram.
    pub corridorness: f32,
    /// Dominant orientation in the sensor frame.
    pub dominant_orientation: Option<f32>,
    /// Points aligned with the dominant orientation.
    pub aligned: usize,
    /// Oriented points crossing the dominant orientation.
    pub cross: usize,
}

impl CorridorWeights {
    /// All-ones weights (no corridor compensation).
    pub fn uniform(len: usize) -> Self {
        Self {
            weights: vec![1.0; len],
            corridorness: 0.0,
            dominant_orientation: None,
            aligned: 0,
            cross: 0,
        }
    }
}

/// Map hint carried into the next frame's preprocessing.
#[derive(Clone, Debug, Default)]
pub struct CorridorFeedback {
    /// Wall histogram of the current area, rotated into the sensor frame.
    pub map_histogram: Option<OrientationHistogram>,
}

/// Detects corridor-like geometry and rebalances correspondence weights.
///
/// In a corridor almost every return lies on the two side walls, which only
/// constrain the cross-axis position. Those points are down-weighted and the
/// few returns on crossing surfaces (end walls, door frames) are up-weighted
/// so the along-axis direction is not swamped in the least-squares solve.
#[derive(Clone, Debug, Default)]
pub struct CorridornessOptimizer {
    config: CorridorConfig,
}

impl CorridornessOptimizer {
    /// Create an optimizer.
    pub fn new(config: CorridorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    /// Length-weighted wall orientations of `area`, in the frame of a sensor
    /// with heading `heading`.
    pub fn map_histogram(&self, map: &AreaGraphMap, area: AreaId, heading: f32) -> OrientationHistogram {
        let mut hist = OrientationHistogram::new(self.config.histogram_bins);
        if let Some(area) = map.area(area) {
            for (_, a, b) in area.walls() {
                let d = b - a;
                hist.add(d.angle() - heading, d.length());
            }
        }
        hist
    }

    /// Orientation histogram of the oriented points.
    pub fn scan_histogram<'a, I>(&self, points: I) -> OrientationHistogram
    where
        I: IntoIterator<Item = &'a ProcessedPoint>,
    {
        let mut hist = OrientationHistogram::new(self.config.histogram_bins);
        for o in points.into_iter().filter_map(|p| p.orientation) {
            hist.add(o, 1.0);
        }
        hist
    }

    /// `scan` with `map` mixed in at `map_histogram_weight` of the scan's mass.
    pub fn merge_map_histogram(
        &self,
        scan: &OrientationHistogram,
        map: Option<&OrientationHistogram>,
    ) -> OrientationHistogram {
        let mut hist = scan.clone();
        if let Some(map) = map {
            if !scan.is_empty() && !map.is_empty() {
                hist.merge(map, self.config.map_histogram_weight * scan.total() / map.total());
            }
        }
        hist
    }

    /// Corridorness and dominant orientation of `hist`.
    pub fn corridorness(&self, hist: &OrientationHistogram) -> (f32, Option<f32>) {
        let corridorness = hist.concentration(deg_to_rad(self.config.peak_window_deg));
        (corridorness, hist.peak().map(|(o, _)| o))
    }

    /// Largest orientation offset of a point aligned with the dominant one (radians).
    #[inline]
    pub fn alignment_tolerance(&self) -> f32 {
        deg_to_rad(self.config.alignment_tolerance_deg)
    }

    /// Per-point weights for `scan` observed from `pose` inside `area`.
    ///
    /// The area's wall histogram is merged into the raw scan histogram, so
    /// the result does not depend on the hint the scan was preprocessed with.
    pub fn compute_weights(
        &self,
        map: &AreaGraphMap,
        scan: &ProcessedScan,
        pose: Pose2D,
        area: AreaId,
    ) -> CorridorWeights {
        let n = scan.points.len();
        if !self.config.enabled {
            return CorridorWeights::uniform(n);
        }

        let map_hist = self.map_histogram(map, area, pose.theta);
        let hist = self.merge_map_histogram(&scan.scan_histogram, Some(&map_hist));
        let (corridorness, dominant) = self.corridorness(&hist);

        let mut out = CorridorWeights {
            corridorness,
            dominant_orientation: dominant,
            ..CorridorWeights::uniform(n)
        };
        let Some(dominant) = dominant else {
            return out;
        };

        let tol = self.alignment_tolerance();
        let aligned: Vec<Option<bool>> = scan
            .points
            .iter()
            .map(|p| p.orientation.map(|o| orientation_diff(o, dominant) <= tol))
            .collect();
        out.aligned = aligned.iter().filter(|a| **a == Some(true)).count();
        out.cross = aligned.iter().filter(|a| **a == Some(false)).count();

        if corridorness < self.config.threshold {
            return out;
        }
        let s = ((corridorness - self.config.threshold) / (1.0 - self.config.threshold)).clamp(0.0, 1.0);
        let w_axis = 1.0 - s * (1.0 - self.config.axis_weight);

        // Cross weight that gives crossing points `cross_share` of the total.
        let w_cross = if out.cross > 0 {
            let share = self.config.cross_share;
            let balanced = share * out.aligned as f32 * w_axis / ((1.0 - share) * out.cross as f32);
            let target = balanced.clamp(1.0, self.config.max_cross_weight);
            1.0 + s * (target - 1.0)
        } else {
            1.0
        };

        for (w, a) in out.weights.iter_mut().zip(&aligned) {
            *w = match a {
                Some(true) => w_axis,
                Some(false) => w_cross,
                None => 1.0,
            };
        }
        log::trace!(
            "Corridor weights: corridorness {:.2}, {} aligned x {:.2}, {} cross x {:.2}",
            corridorness,
            out.aligned,
            w_axis,
            out.cross,
            w_cross
        );
        out
    }

    /// Feedback for the next frame's preprocessing.
    pub fn feedback(&self, map: &AreaGraphMap, pose: Pose2D, area: AreaId) -> CorridorFeedback {
        CorridorFeedback {
            map_histogram: Some(self.map_histogram(map, area, pose.theta)),
        }
    }
}
