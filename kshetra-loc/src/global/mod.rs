//! Global localization: find the pose without a prior.
//!
//! # Pipeline
//!
//! ```text
//! candidates (grid | random | around guess particles)
//!       │  coarse range-agreement score, parallel over candidates
//!       ▼
//! non-maximum suppression ──▶ top_k distinct hypotheses
//!       │  PoseTracker refinement, parallel over hypotheses
//!       ▼
//! fine rescoring + suppression
//!       │  confidence = best - second best
//!       ▼
//! GlobalResult (invalid below min_fitness)
//! ```
//!
//! A near-tie between two distinct hypotheses (symmetric rooms, repeated
//! corridors) yields low confidence even when the best fitness is high.

mod candidates;
mod config;
mod scoring;

pub use candidates::{Candidate, InitialGuess, WeightedPose, blind_candidates, guess_candidates};
pub use config::{CandidateStrategy, GlobalConfig};
pub use scoring::ScoredCandidate;

use rayon::prelude::*;

use crate::core::Pose2D;
use crate::core::math::deg_to_rad;
use crate::intersect::RayMapIntersector;
use crate::map::AreaId;
use crate::modes::CancelToken;
use crate::preprocess::ProcessedScan;
use crate::tracking::{PoseTracker, TrackState};
use scoring::{ScoreParams, score_pose, suppress};

/// Outcome of [`GlobalLocalizer::localize`].
#[derive(Clone, Debug)]
pub struct GlobalResult {
    /// Best pose (meaningless when `valid` is false).
    pub pose: Pose2D,
    /// Area containing `pose`.
    pub area: AreaId,
    /// Refined range agreement of the best hypothesis (0..1).
    pub fitness: f32,
    /// Fitness margin over the runner-up (0..1).
    pub confidence: f32,
    /// True when `fitness >= min_fitness`.
    pub valid: bool,
    /// Candidates scored.
    pub candidates: usize,
    /// Hypotheses refined.
    pub hypotheses: usize,
    /// True when the candidates came from an initial guess.
    pub seeded: bool,
    /// True when a newer scan interrupted the search.
    pub cancelled: bool,
}

impl GlobalResult {
    fn invalid(candidates: usize) -> Self {
        Self {
            pose: Pose2D::identity(),
            area: AreaId(0),
            fitness: 0.0,
            confidence: 0.0,
            valid: false,
            candidates,
            hypotheses: 0,
            seeded: false,
            cancelled: false,
        }
    }
}

/// Searches the whole map (or the neighbourhood of a guess) for the scan's pose.
#[derive(Clone, Debug, Default)]
pub struct GlobalLocalizer {
    config: GlobalConfig,
}

impl GlobalLocalizer {
    /// Create a localizer.
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Localize `scan` with no prior pose.
    ///
    /// With a non-empty `guess` only the neighbourhood of its particles is
    /// searched; a guess with no particle inside the map falls back to a
    /// blind search.
    pub fn localize(
        &self,
        intersector: &RayMapIntersector<'_>,
        tracker: &PoseTracker,
        scan: &ProcessedScan,
        guess: Option<&InitialGuess>,
        cancel: &CancelToken,
    ) -> GlobalResult {
        let cfg = &self.config;
        if !scan.valid || scan.is_empty() {
            return GlobalResult::invalid(0);
        }
        let map = intersector.map();

        let mut seeded = false;
        let mut candidates = Vec::new();
        if let Some(guess) = guess.filter(|g| !g.is_empty()) {
            candidates = guess_candidates(map, guess, cfg);
            seeded = !candidates.is_empty();
            if !seeded {
                log::warn!("Initial guess has no particle inside the map, searching blind");
            }
        }
        if candidates.is_empty() {
            candidates = blind_candidates(map, cfg);
        }
        if candidates.is_empty() {
            log::warn!("Global localization: no admissible candidate pose");
            return GlobalResult::invalid(0);
        }

        let indices = scan.subsample_indices(cfg.scoring_points);
        let coarse = ScoreParams {
            sigma: cfg.scoring_sigma,
            outside_penalty: cfg.outside_penalty,
            outside_margin: cfg.outside_margin,
            parallel: cfg.use_parallel,
        };
        let score_one = |c: &Candidate| ScoredCandidate {
            candidate: *c,
            score: if cancel.is_cancelled() {
                0.0
            } else {
                score_pose(intersector, scan, &indices, c.pose, c.area, coarse)
            },
        };
        let scored: Vec<ScoredCandidate> = if cfg.use_parallel {
            candidates.par_iter().map(score_one).collect()
        } else {
            candidates.iter().map(score_one).collect()
        };
        if cancel.is_cancelled() {
            return self.cancelled(candidates.len(), seeded);
        }

        let radius = cfg.nms_radius;
        let heading = deg_to_rad(cfg.nms_heading_deg);
        let hypotheses = suppress(scored, radius, heading, cfg.top_k);

        let fine = ScoreParams {
            sigma: cfg.fitness_sigma,
            ..coarse
        };
        let refine_one = |h: &ScoredCandidate| {
            let result = tracker.refine(intersector, scan, h.candidate.pose, h.candidate.area, None, cancel);
            let candidate = match result.state {
                TrackState::Converged | TrackState::IterationExhausted => Candidate {
                    pose: result.pose,
                    area: result.area,
                },
                _ => h.candidate,
            };
            ScoredCandidate {
                candidate,
                score: score_pose(intersector, scan, &indices, candidate.pose, candidate.area, fine),
            }
        };
        let refined: Vec<ScoredCandidate> = if cfg.use_parallel {
            hypotheses.par_iter().map(refine_one).collect()
        } else {
            hypotheses.iter().map(refine_one).collect()
        };
        if cancel.is_cancelled() {
            return self.cancelled(candidates.len(), seeded);
        }

        let ranked = suppress(refined, radius, heading, cfg.top_k);
        let Some(best) = ranked.first().copied() else {
            return GlobalResult::invalid(candidates.len());
        };
        let second = ranked.get(1).map_or(0.0, |s| s.score);
        let confidence = (best.score - second).max(0.0);
        let valid = best.score >= cfg.min_fitness;

        if valid {
            log::info!(
                "Global localization: ({:.2}, {:.2}, {:.1}°) in area {}, fitness {:.2}, confidence {:.2} ({} candidates{})",
                best.candidate.pose.x,
                best.candidate.pose.y,
                best.candidate.pose.theta.to_degrees(),
                best.candidate.area,
                best.score,
                confidence,
                candidates.len(),
                if seeded { ", seeded" } else { "" }
            );
        } else {
            log::debug!(
                "Global localization failed: best fitness {:.2} < {:.2} over {} candidates",
                best.score,
                cfg.min_fitness,
                candidates.len()
            );
        }

        GlobalResult {
            pose: best.candidate.pose,
            area: best.candidate.area,
            fitness: best.score,
            confidence,
            valid,
            candidates: candidates.len(),
            hypotheses: hypotheses.len(),
            seeded,
            cancelled: false,
        }
    }

    fn cancelled(&self, candidates: usize, seeded: bool) -> GlobalResult {
        log::debug!("Global localization cancelled after {} candidates", candidates);
        GlobalResult {
            seeded,
            cancelled: true,
            ..GlobalResult::invalid(candidates)
        }
    }
}
