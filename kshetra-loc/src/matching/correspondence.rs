//! Point-to-wall correspondences for one scan, one area and one pose.
//!
//! Transient: rebuilt on every scoring or refinement step.

use rayon::prelude::*;

use crate::core::{Point2D, Pose2D};
use crate::intersect::RayMapIntersector;
use crate::map::{AreaId, EdgeRef, PolygonGeometry};
use crate::preprocess::ProcessedScan;

/// Below this many points correspondences are built sequentially.
const PARALLEL_MIN_POINTS: usize = 64;

/// One scan point matched to the wall its bearing ray hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    /// Index into `ProcessedScan::points`.
    pub point_idx: usize,
    /// Matched wall edge.
    pub edge: EdgeRef,
    /// Scan point in the map frame under the evaluated pose.
    pub world_point: Point2D,
    /// Inward unit normal of the wall.
    pub normal: Point2D,
    /// Signed perpendicular distance to the wall line (positive = inside).
    pub residual: f32,
    /// Predicted wall range along the bearing.
    pub predicted_range: f32,
    /// Combined weight (external x incidence reliability).
    pub weight: f32,
}

/// Correspondences of one evaluation step.
#[derive(Clone, Debug, Default)]
pub struct CorrespondenceSet {
    items: Vec<Correspondence>,
}

impl CorrespondenceSet {
    /// Match every point of `scan` under `pose`, casting rays from `area`.
    ///
    /// `weights` (one per point) scale each correspondence; grazing returns
    /// are additionally scaled by `max(min_incidence_weight, |cos incidence|)`.
    /// Points whose ray misses every wall produce no correspondence.
    pub fn build(
        intersector: &RayMapIntersector<'_>,
        scan: &ProcessedScan,
        pose: Pose2D,
        area: AreaId,
        weights: Option<&[f32]>,
        min_incidence_weight: f32,
    ) -> Self {
        let map = intersector.map();
        let one = |idx: usize| -> Option<Correspondence> {
            let p = &scan.points[idx];
            let hit = intersector.intersect(p, pose, area);
            let edge = hit.edge?;
            let polygon = map.area(edge.area)?;
            let normal = polygon.inward_normal(edge.edge);
            let (a, _) = polygon.edge(edge.edge);

            let world_point = pose.transform_point(p.point);
            let residual = normal.dot(world_point - a);
            let dir = pose.rotate_vector(p.direction());
            let reliability = normal.dot(dir).abs().max(min_incidence_weight);
            let external = weights.and_then(|w| w.get(idx)).copied().unwrap_or(1.0);

            Some(Correspondence {
                point_idx: idx,
                edge,
                world_point,
                normal,
                residual,
                predicted_range: hit.range,
                weight: external * reliability,
            })
        };

        let n = scan.points.len();
        let items = if intersector.config().use_parallel && n >= PARALLEL_MIN_POINTS {
            (0..n).into_par_iter().filter_map(one).collect()
        } else {
            (0..n).filter_map(one).collect()
        };
        Self { items }
    }

    /// Wrap prepared correspondences.
    pub fn from_vec(items: Vec<Correspondence>) -> Self {
        Self { items }
    }

    /// Number of correspondences.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Correspondences in point order.
    #[inline]
    pub fn as_slice(&self) -> &[Correspondence] {
        &self.items
    }

    /// Iterate correspondences.
    pub fn iter(&self) -> impl Iterator<Item = &Correspondence> {
        self.items.iter()
    }

    /// Drop correspondences with `|residual| > threshold`; returns how many went.
    ///
    /// Never grows the set.
    pub fn reject_outliers(&mut self, threshold: f32) -> usize {
        let before = self.items.len();
        self.items.retain(|c| c.residual.abs() <= threshold);
        before - self.items.len()
    }

    /// Sum of weights.
    pub fn total_weight(&self) -> f32 {
        self.items.iter().map(|c| c.weight).sum()
    }

    /// Root mean square residual (unweighted).
    pub fn rms_residual(&self) -> f32 {
        if self.items.is_empty() {
            return f32::INFINITY;
        }
        let sum: f32 = self.items.iter().map(|c| c.residual * c.residual).sum();
        (sum / self.items.len() as f32).sqrt()
    }

    /// Weighted mean of `min(residual², gate²)`; infinite when empty.
    ///
    /// Every correspondence counts, so costs of different poses stay
    /// comparable while the refinement's own outlier threshold shrinks.
    pub fn truncated_cost(&self, gate: f32) -> f32 {
        let total = self.total_weight();
        if self.items.is_empty() || total <= 0.0 {
            return f32::INFINITY;
        }
        let gate_sq = gate * gate;
        let sum: f32 = self
            .items
            .iter()
            .map(|c| c.weight * (c.residual * c.residual).min(gate_sq))
            .sum();
        sum / total
    }

    /// Share of `total_points` that found an inlier correspondence.
    pub fn inlier_ratio(&self, total_points: usize) -> f32 {
        if total_points == 0 {
            0.0
        } else {
            self.items.len() as f32 / total_points as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScanIndex;
    use crate::corridor::OrientationHistogram;
    use crate::intersect::IntersectConfig;
    use crate::map::AreaGraphMap;
    use crate::preprocess::{PreprocessStats, ProcessedPoint};
    use approx::assert_relative_eq;

    const SQUARE: &str = "areas: [ { id: 1, vertices: [[0, 0], [4, 0], [4, 4], [0, 4]] } ]";

    fn scan(points: &[(f32, f32)]) -> ProcessedScan {
        let points: Vec<ProcessedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| ProcessedPoint {
                point: Point2D::new(x, y),
                range: (x * x + y * y).sqrt(),
                index: ScanIndex::new(0, i),
                z: 0.0,
                intensity: 1.0,
                orientation: None,
            })
            .collect();
        ProcessedScan {
            sequence: 0,
            stamp_us: 0,
            retained: vec![true; points.len()],
            scan_histogram: OrientationHistogram::new(36),
            histogram: OrientationHistogram::new(36),
            corridorness: 0.0,
            dominant_orientation: None,
            sector_corridorness: Vec::new(),
            stats: PreprocessStats::default(),
            valid: true,
            points,
        }
    }

    #[test]
    fn test_residual_sign_and_weight() {
        let map = AreaGraphMap::from_yaml_str(SQUARE).unwrap();
        let ix = RayMapIntersector::new(&map, IntersectConfig::default());
        // Sensor at (2, 2): +X wall is 2 m away. One point short, one beyond.
        let s = scan(&[(1.8, 0.0), (2.3, 0.0)]);
        let set = CorrespondenceSet::build(&ix, &s, Pose2D::new(2.0, 2.0, 0.0), AreaId(1), Some(&[2.0, 1.0]), 0.2);
        assert_eq!(set.len(), 2);
        let c = set.as_slice();
        assert_relative_eq!(c[0].residual, 0.2, epsilon = 1e-5);
        assert_relative_eq!(c[1].residual, -0.3, epsilon = 1e-5);
        assert_relative_eq!(c[0].weight, 2.0, epsilon = 1e-5);
        assert_relative_eq!(c[0].predicted_range, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_grazing_return_down_weighted() {
        let map = AreaGraphMap::from_yaml_str(SQUARE).unwrap();
        let ix = RayMapIntersector::new(&map, IntersectConfig::default());
        // From (0.5, 0.5) a ray along +X meets the right wall head-on, while a
        // shallow downward ray grazes the bottom wall.
        let s = scan(&[(3.5, 0.0), (3.0, -0.45)]);
        let set = CorrespondenceSet::build(&ix, &s, Pose2D::new(0.5, 0.5, 0.0), AreaId(1), None, 0.2);
        let c = set.as_slice();
        assert!(c[0].weight > 0.99);
        assert_eq!(c[1].edge.edge, 0);
        assert!(c[1].weight <= 0.2 + 1e-6, "grazing weight {}", c[1].weight);
    }

    #[test]
    fn test_outlier_rejection_monotone() {
        let map = AreaGraphMap::from_yaml_str(SQUARE).unwrap();
        let ix = RayMapIntersector::new(&map, IntersectConfig::default());
        let s = scan(&[(1.9, 0.0), (1.0, 0.0), (0.0, 1.95), (-2.5, 0.0)]);
        let mut set = CorrespondenceSet::build(&ix, &s, Pose2D::new(2.0, 2.0, 0.0), AreaId(1), None, 0.2);
        let mut last = set.len();
        for threshold in [2.0, 0.6, 0.2, 0.06, 0.0] {
            set.reject_outliers(threshold);
            assert!(set.len() <= last);
            last = set.len();
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_truncated_cost_caps_far_residuals() {
        let map = AreaGraphMap::from_yaml_str(SQUARE).unwrap();
        let ix = RayMapIntersector::new(&map, IntersectConfig::default());
        let s = scan(&[(1.8, 0.0), (2.3, 0.0)]);
        let mut set = CorrespondenceSet::build(&ix, &s, Pose2D::new(2.0, 2.0, 0.0), AreaId(1), Some(&[2.0, 1.0]), 0.2);
        // 0.2 m residual at weight 2, 0.3 m residual capped at 0.25 m.
        assert_relative_eq!(set.truncated_cost(0.25), (2.0 * 0.04 + 0.0625) / 3.0, epsilon = 1e-5);
        set.reject_outliers(0.0);
        assert_eq!(set.truncated_cost(0.25), f32::INFINITY);
    }
}
