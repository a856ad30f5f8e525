//! Range-agreement scoring and hypothesis suppression.

use rayon::prelude::*;

use super::candidates::Candidate;
use crate::core::Pose2D;
use crate::intersect::RayMapIntersector;
use crate::map::AreaId;
use crate::preprocess::ProcessedScan;

/// Below this many points a candidate is scored sequentially.
const PARALLEL_MIN_POINTS: usize = 64;

/// Parameters of one scoring pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScoreParams {
    pub sigma: f32,
    pub outside_penalty: f32,
    pub outside_margin: f32,
    /// Split the points of one candidate across the rayon pool.
    pub parallel: bool,
}

/// Candidate with its score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredCandidate {
    /// Hypothesis.
    pub candidate: Candidate,
    /// Agreement in [0, 1].
    pub score: f32,
}

/// Mean range agreement of the points `indices` of `scan` seen from `pose`.
///
/// Each point scores `exp(-d²/2σ²)` with `d = observed - predicted`, a
/// penalty when it lies beyond the predicted wall by more than the margin,
/// and zero when its ray leaves the map. Clamped to [0, 1].
pub(crate) fn score_pose(
    intersector: &RayMapIntersector<'_>,
    scan: &ProcessedScan,
    indices: &[usize],
    pose: Pose2D,
    area: AreaId,
    params: ScoreParams,
) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    let inv_two_sigma_sq = 1.0 / (2.0 * params.sigma * params.sigma);
    let agreement = |&i: &usize| -> f32 {
        let p = &scan.points[i];
        let hit = intersector.intersect(p, pose, area);
        if !hit.hit {
            return 0.0;
        }
        let d = p.range - hit.range;
        if d > params.outside_margin {
            -params.outside_penalty
        } else {
            (-d * d * inv_two_sigma_sq).exp()
        }
    };
    // Collected before summing so the total does not depend on the split.
    let total: f32 = if params.parallel && indices.len() >= PARALLEL_MIN_POINTS {
        let parts: Vec<f32> = indices.par_iter().map(agreement).collect();
        parts.iter().sum()
    } else {
        indices.iter().map(agreement).sum()
    };
    (total / indices.len() as f32).clamp(0.0, 1.0)
}

/// Sort by score (descending, stable) and keep at most `k` mutually distinct hypotheses.
///
/// Two hypotheses are the same when both their distance is below `radius`
/// and their heading difference is below `heading`.
pub(crate) fn suppress(mut scored: Vec<ScoredCandidate>, radius: f32, heading: f32, k: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<ScoredCandidate> = Vec::with_capacity(k);
    for s in scored {
        if kept.len() >= k {
            break;
        }
        let duplicate = kept.iter().any(|q| {
            q.candidate.pose.distance(s.candidate.pose) < radius
                && q.candidate.pose.heading_error(s.candidate.pose) < heading
        });
        if !duplicate {
            kept.push(s);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::IntersectConfig;
    use crate::map::AreaGraphMap;
    use crate::preprocess::{PreprocessConfig, ScanPreprocessor};
    use crate::sim::SyntheticLidar;

    const ROOM: &str = r#"
areas:
  - id: 1
    vertices: [[0, 0], [10, 0], [10, 6], [0, 6]]
"#;

    fn scored(x: f32, theta: f32, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate {
                pose: Pose2D::new(x, 0.0, theta),
                area: AreaId(1),
            },
            score,
        }
    }

    #[test]
    fn test_suppress_keeps_best_of_cluster() {
        let kept = suppress(
            vec![scored(0.0, 0.0, 0.5), scored(0.1, 0.05, 0.9), scored(2.0, 0.0, 0.7), scored(0.0, 3.0, 0.6)],
            0.5,
            0.35,
            10,
        );
        let scores: Vec<f32> = kept.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.6]);
    }

    #[test]
    fn test_suppress_limits_count() {
        let all = (0..20).map(|i| scored(i as f32, 0.0, i as f32 / 20.0)).collect();
        let kept = suppress(all, 0.5, 0.35, 4);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].score, 19.0 / 20.0);
    }

    #[test]
    fn test_parallel_score_matches_sequential() {
        let map = AreaGraphMap::from_yaml_str(ROOM).unwrap();
        let truth = Pose2D::new(4.0, 3.0, 0.3);
        let raw = SyntheticLidar::default()
            .with_shape(4, 720)
            .generate(&map, truth, AreaId(1), 1)
            .unwrap();
        let scan = ScanPreprocessor::new(PreprocessConfig::default().with_downsampling(false)).process(&raw, None);
        let indices = scan.subsample_indices(0);
        assert!(indices.len() >= PARALLEL_MIN_POINTS);

        let ix = RayMapIntersector::new(&map, IntersectConfig::default().with_parallel(false));
        let sequential = ScoreParams {
            sigma: 0.2,
            outside_penalty: 0.5,
            outside_margin: 0.3,
            parallel: false,
        };
        let parallel = ScoreParams {
            parallel: true,
            ..sequential
        };
        for pose in [truth, Pose2D::new(5.0, 2.5, 0.1), Pose2D::new(2.0, 4.0, -1.0)] {
            let seq = score_pose(&ix, &scan, &indices, pose, AreaId(1), sequential);
            let par = score_pose(&ix, &scan, &indices, pose, AreaId(1), parallel);
            assert_eq!(seq, par);
        }
        let at_truth = score_pose(&ix, &scan, &indices, truth, AreaId(1), parallel);
        let off = score_pose(&ix, &scan, &indices, Pose2D::new(5.0, 2.5, 0.1), AreaId(1), parallel);
        assert!(at_truth > off);
    }
}
