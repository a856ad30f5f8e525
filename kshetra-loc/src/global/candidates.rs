//! Candidate pose generation for global search.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::config::{CandidateStrategy, GlobalConfig};
use crate::core::math::deg_to_rad;
use crate::core::{Point2D, Pose2D};
use crate::map::{AreaGraphMap, AreaId, point_segment_distance};

/// Rejection-sampling attempts per requested random candidate.
const RANDOM_ATTEMPTS_PER_CANDIDATE: usize = 20;

/// Slack when counting whole steps in a window.
const STEP_EPS: f32 = 1e-3;

/// One hypothesis: a pose and the area containing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Candidate sensor pose.
    pub pose: Pose2D,
    /// Area containing `pose`.
    pub area: AreaId,
}

/// Externally supplied weighted particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedPose {
    /// Particle position in the map frame.
    pub position: Point2D,
    /// Particle heading; `None` sweeps all headings.
    #[serde(default)]
    pub heading: Option<f32>,
    /// Relative weight; particles are searched heaviest first.
    #[serde(default = "unit_weight")]
    pub weight: f32,
}

fn unit_weight() -> f32 {
    1.0
}

impl WeightedPose {
    /// Particle with a known heading.
    pub fn new(position: Point2D, heading: f32, weight: f32) -> Self {
        Self {
            position,
            heading: Some(heading),
            weight,
        }
    }

    /// Particle without heading.
    pub fn position_only(position: Point2D, weight: f32) -> Self {
        Self {
            position,
            heading: None,
            weight,
        }
    }
}

/// Set of weighted particles seeding a local search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialGuess {
    /// Particles, any order.
    pub particles: Vec<WeightedPose>,
}

impl InitialGuess {
    /// Wrap particles.
    pub fn new(particles: Vec<WeightedPose>) -> Self {
        Self { particles }
    }

    /// Single particle guess.
    pub fn single(particle: WeightedPose) -> Self {
        Self::new(vec![particle])
    }

    /// True when there is nothing usable.
    pub fn is_empty(&self) -> bool {
        !self.particles.iter().any(|p| p.weight > 0.0)
    }
}

/// Area containing `p` with at least `clearance` to every wall.
fn admissible(map: &AreaGraphMap, p: Point2D, clearance: f32) -> Option<AreaId> {
    let id = map.locate(p)?;
    let area = map.area(id)?;
    let clear = area
        .walls()
        .all(|(_, a, b)| point_segment_distance(p, a, b).0 >= clearance);
    clear.then_some(id)
}

/// Headings `start, start + step, ...` covering `span` radians.
fn heading_sweep(start: f32, span: f32, step: f32) -> impl Iterator<Item = f32> {
    let n = ((span / step).round() as usize).max(1);
    (0..n).map(move |k| start + k as f32 * step)
}

/// Candidates for a blind search over the whole map.
pub fn blind_candidates(map: &AreaGraphMap, config: &GlobalConfig) -> Vec<Candidate> {
    match config.strategy {
        CandidateStrategy::Grid => grid_candidates(map, config),
        CandidateStrategy::Random { count, seed } => random_candidates(map, config, count, seed),
    }
}

fn grid_candidates(map: &AreaGraphMap, config: &GlobalConfig) -> Vec<Candidate> {
    let bounds = map.bounds();
    let step = config.position_step;
    let heading_step = deg_to_rad(config.heading_step_deg);
    let nx = (bounds.width() / step).floor() as usize + 1;
    let ny = (bounds.height() / step).floor() as usize + 1;

    let mut out = Vec::new();
    for iy in 0..ny {
        for ix in 0..nx {
            let p = Point2D::new(
                bounds.min.x + (ix as f32 + 0.5) * step,
                bounds.min.y + (iy as f32 + 0.5) * step,
            );
            let Some(area) = admissible(map, p, config.wall_clearance) else {
                continue;
            };
            for heading in heading_sweep(-PI, 2.0 * PI, heading_step) {
                out.push(Candidate {
                    pose: Pose2D::from_position(p, heading),
                    area,
                });
            }
        }
    }
    out
}

fn random_candidates(map: &AreaGraphMap, config: &GlobalConfig, count: usize, seed: u64) -> Vec<Candidate> {
    let bounds = map.bounds();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(count);
    let mut attempts = 0;
    while out.len() < count && attempts < count * RANDOM_ATTEMPTS_PER_CANDIDATE {
        attempts += 1;
        let p = Point2D::new(
            rng.random_range(bounds.min.x..bounds.max.x),
            rng.random_range(bounds.min.y..bounds.max.y),
        );
        if let Some(area) = admissible(map, p, config.wall_clearance) {
            let heading = rng.random_range(-PI..PI);
            out.push(Candidate {
                pose: Pose2D::from_position(p, heading),
                area,
            });
        }
    }
    if out.len() < count {
        log::debug!("Random candidates: {} of {} after {} draws", out.len(), count, attempts);
    }
    out
}

/// Candidates for a local search around each particle of `guess`.
///
/// Particles outside the map contribute nothing.
pub fn guess_candidates(map: &AreaGraphMap, guess: &InitialGuess, config: &GlobalConfig) -> Vec<Candidate> {
    let mut particles: Vec<&WeightedPose> = guess.particles.iter().filter(|p| p.weight > 0.0).collect();
    particles.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    particles.truncate(config.max_guess_particles);

    let step = config.guess_position_step;
    let reach = (config.guess_radius / step + STEP_EPS).floor() as i32;
    let heading_step = deg_to_rad(config.heading_step_deg);
    let window = deg_to_rad(config.guess_heading_window_deg);

    let mut out = Vec::new();
    for particle in particles {
        for iy in -reach..=reach {
            for ix in -reach..=reach {
                let offset = Point2D::new(ix as f32 * step, iy as f32 * step);
                if offset.length() > config.guess_radius + 1e-6 {
                    continue;
                }
                let p = particle.position + offset;
                let Some(area) = map.locate(p) else {
                    continue;
                };
                let headings: Vec<f32> = match particle.heading {
                    Some(h) => {
                        let k = (window / heading_step + STEP_EPS).floor() as i32;
                        (-k..=k).map(|i| h + i as f32 * heading_step).collect()
                    }
                    None => heading_sweep(-PI, 2.0 * PI, heading_step).collect(),
                };
                out.extend(headings.into_iter().map(|heading| Candidate {
                    pose: Pose2D::from_position(p, heading),
                    area,
                }));
            }
        }
    }
    out
}
