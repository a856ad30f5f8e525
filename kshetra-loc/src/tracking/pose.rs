//! Local pose refinement by weighted point-to-line alignment.
//!
//! # State Machine
//!
//! ```text
//!   Seeded ──▶ Iterating ──┬──▶ Converged           (step below epsilon)
//!                 ▲   │    ├──▶ IterationExhausted  (budget spent, best pose kept)
//!                 └───┘    ├──▶ Diverged            (cost rose more than `patience`
//!                          │                         times in a row, or too few
//!                          │                         correspondences)
//!                          └──▶ Cancelled           (newer scan arrived)
//! ```

use super::config::TrackingConfig;
use crate::core::Pose2D;
use crate::intersect::RayMapIntersector;
use crate::map::AreaId;
use crate::matching::{CorrespondenceSet, PoseIncrement, solve_increment};
use crate::modes::CancelToken;
use crate::preprocess::ProcessedScan;

/// Lifecycle of one refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// Prior accepted, nothing evaluated yet.
    Seeded,
    /// Alignment in progress.
    Iterating,
    /// Step fell below the convergence thresholds.
    Converged,
    /// Iteration budget spent; the best pose seen is returned.
    IterationExhausted,
    /// Cost kept rising or the scan stopped matching the map.
    Diverged,
    /// Abandoned because a newer scan arrived.
    Cancelled,
}

/// Outcome of [`PoseTracker::refine`].
#[derive(Clone, Debug)]
pub struct TrackingResult {
    /// Refined pose (best seen unless converged).
    pub pose: Pose2D,
    /// Area the final correspondences were cast from.
    pub area: AreaId,
    /// Terminal state.
    pub state: TrackState,
    /// True only for [`TrackState::Converged`].
    pub converged: bool,
    /// 0..1, from inlier share and residual; penalized when not converged.
    pub confidence: f32,
    /// Increments applied.
    pub iterations: usize,
    /// RMS point-to-line residual of the inliers at `pose` (meters).
    pub rms_residual: f32,
    /// Inlier correspondences at `pose`.
    pub inliers: usize,
    /// First increment computed from the prior.
    pub first_increment: Option<PoseIncrement>,
    /// Last increment applied.
    pub last_increment: Option<PoseIncrement>,
}

impl TrackingResult {
    fn failed(prior: Pose2D, area: AreaId, state: TrackState, iterations: usize) -> Self {
        Self {
            pose: prior,
            area,
            state,
            converged: false,
            confidence: 0.0,
            iterations,
            rms_residual: f32::INFINITY,
            inliers: 0,
            first_increment: None,
            last_increment: None,
        }
    }
}

/// Relative slack before a cost counts as having risen.
const COST_RISE_TOLERANCE: f32 = 1e-3;

/// Counts consecutive cost increases; `patience` of them are tolerated.
#[derive(Clone, Copy, Debug)]
struct DivergenceMonitor {
    patience: usize,
    last: f32,
    rising: usize,
}

impl DivergenceMonitor {
    fn new(patience: usize) -> Self {
        Self {
            patience,
            last: f32::INFINITY,
            rising: 0,
        }
    }

    /// Record the next iterate's cost; true once it has risen more than `patience` times in a row.
    fn observe(&mut self, cost: f32) -> bool {
        if cost > self.last * (1.0 + COST_RISE_TOLERANCE) + 1e-9 {
            self.rising += 1;
        } else {
            self.rising = 0;
        }
        self.last = cost;
        self.rising > self.patience
    }
}

/// Refines a prior pose against the walls of the current area.
#[derive(Clone, Debug, Default)]
pub struct PoseTracker {
    config: TrackingConfig,
}

impl PoseTracker {
    /// Create a tracker.
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Refine `prior` for `scan`, casting from `area`.
    ///
    /// `weights` (one per retained point) come from the corridor optimizer.
    pub fn refine(
        &self,
        intersector: &RayMapIntersector<'_>,
        scan: &ProcessedScan,
        prior: Pose2D,
        area: AreaId,
        weights: Option<&[f32]>,
        cancel: &CancelToken,
    ) -> TrackingResult {
        let cfg = &self.config;
        let mut state = TrackState::Seeded;
        let mut pose = prior;
        let mut area = area;
        let mut threshold = cfg.outlier_threshold;
        let mut divergence = DivergenceMonitor::new(cfg.divergence_patience);
        let mut iterations = 0;
        let mut first_increment = None;
        let mut last_increment = None;
        let mut best: Option<(Pose2D, AreaId, f32)> = None;

        while state == TrackState::Seeded || state == TrackState::Iterating {
            if cancel.is_cancelled() {
                state = TrackState::Cancelled;
                break;
            }
            state = TrackState::Iterating;

            area = intersector.resolve_area(pose.position(), area).unwrap_or(area);
            let mut set = CorrespondenceSet::build(
                intersector,
                scan,
                pose,
                area,
                weights,
                cfg.min_incidence_weight,
            );

            // Scored under the initial gate so iterates stay comparable.
            let cost = set.truncated_cost(cfg.outlier_threshold);
            if best.is_none_or(|(_, _, c)| cost < c) {
                best = Some((pose, area, cost));
            }
            if divergence.observe(cost) {
                log::debug!(
                    "Tracking diverged: cost rose {} times in a row at iteration {}",
                    divergence.rising,
                    iterations
                );
                state = TrackState::Diverged;
                break;
            }
            if iterations >= cfg.max_iterations {
                state = TrackState::IterationExhausted;
                break;
            }

            set.reject_outliers(threshold);
            if set.len() < cfg.min_correspondences {
                log::debug!(
                    "Tracking diverged: {} correspondences at iteration {}",
                    set.len(),
                    iterations
                );
                state = TrackState::Diverged;
                break;
            }

            let Some(step) = solve_increment(&set, pose, cfg.robust_kernel, cfg.damping) else {
                state = TrackState::Diverged;
                break;
            };
            let step = step.clamped(cfg.max_step_translation, cfg.max_step_rotation);
            first_increment.get_or_insert(step);
            last_increment = Some(step);
            pose = step.apply(pose);
            iterations += 1;
            threshold = (threshold * cfg.outlier_decay).max(cfg.min_outlier_threshold);

            if step.translation() < cfg.translation_epsilon && step.rotation() < cfg.rotation_epsilon {
                state = TrackState::Converged;
            }
        }

        let (pose, area) = match (state, best) {
            (TrackState::Converged, _) => (pose, area),
            (TrackState::IterationExhausted, Some((p, a, _))) => (p, a),
            (_, best) => {
                let (p, a) = best.map_or((prior, area), |(p, a, _)| (p, a));
                let mut failed = TrackingResult::failed(p, a, state, iterations);
                failed.first_increment = first_increment;
                failed.last_increment = last_increment;
                return failed;
            }
        };

        // Final evaluation at the returned pose with the tightest threshold.
        let area = intersector.resolve_area(pose.position(), area).unwrap_or(area);
        let mut set = CorrespondenceSet::build(intersector, scan, pose, area, None, cfg.min_incidence_weight);
        set.reject_outliers(threshold);
        let rms = set.rms_residual();
        let inlier_ratio = set.inlier_ratio(scan.points.len());
        let sigma = cfg.confidence_sigma.max(f32::EPSILON);
        let mut confidence = inlier_ratio * (-0.5 * (rms / sigma).powi(2)).exp();
        let converged = state == TrackState::Converged;
        if !converged {
            confidence *= cfg.unconverged_penalty;
        }

        log::trace!(
            "Tracking {:?} after {} iterations: rms {:.3} m, {} inliers, confidence {:.2}",
            state,
            iterations,
            rms,
            set.len(),
            confidence
        );

        TrackingResult {
            pose,
            area,
            state,
            converged,
            confidence: if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 },
            iterations,
            rms_residual: rms,
            inliers: set.len(),
            first_increment,
            last_increment,
        }
    }
}
