//! Global localization configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// How blind-search candidates are generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Regular position grid over every area, full heading sweep per cell.
    #[default]
    Grid,
    /// Uniformly sampled poses inside the map.
    Random {
        /// Number of candidates.
        count: usize,
        /// RNG seed; equal seeds give equal candidate sets.
        seed: u64,
    },
}

/// Configuration for [`GlobalLocalizer`](super::GlobalLocalizer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Blind-search candidate generation.
    #[serde(default)]
    pub strategy: CandidateStrategy,

    /// Grid position step (meters).
    /// Default: 0.4
    #[serde(default = "defaults::position_step")]
    pub position_step: f32,

    /// Heading step for grid cells and guess sweeps (degrees).
    /// Default: 10.0
    #[serde(default = "defaults::heading_step_deg")]
    pub heading_step_deg: f32,

    /// Candidates closer than this to a wall are skipped (meters).
    /// Default: 0.2
    #[serde(default = "defaults::wall_clearance")]
    pub wall_clearance: f32,

    /// Search radius around each guess particle (meters).
    /// Default: 1.0
    #[serde(default = "defaults::guess_radius")]
    pub guess_radius: f32,

    /// Position step of the local search around a particle (meters).
    /// Default: 0.2
    #[serde(default = "defaults::guess_position_step")]
    pub guess_position_step: f32,

    /// Half-width of the heading search around a particle heading (degrees).
    /// Default: 30.0
    #[serde(default = "defaults::guess_heading_window_deg")]
    pub guess_heading_window_deg: f32,

    /// Heaviest particles searched; the rest are ignored.
    /// Default: 32
    #[serde(default = "defaults::max_guess_particles")]
    pub max_guess_particles: usize,

    /// Scan points used per candidate score.
    /// Default: 120
    #[serde(default = "defaults::scoring_points")]
    pub scoring_points: usize,

    /// Range agreement scale of the coarse score (meters).
    /// Default: 0.4
    #[serde(default = "defaults::scoring_sigma")]
    pub scoring_sigma: f32,

    /// Range agreement scale after refinement (meters).
    /// Default: 0.1
    #[serde(default = "defaults::fitness_sigma")]
    pub fitness_sigma: f32,

    /// Score subtracted for a return observed beyond the predicted wall.
    /// Default: 0.5
    #[serde(default = "defaults::outside_penalty")]
    pub outside_penalty: f32,

    /// Slack before a return counts as beyond the wall (meters).
    /// Default: 0.3
    #[serde(default = "defaults::outside_margin")]
    pub outside_margin: f32,

    /// Distinct hypotheses refined after coarse scoring.
    /// Default: 12
    #[serde(default = "defaults::top_k")]
    pub top_k: usize,

    /// Hypotheses closer than this are the same (meters)...
    /// Default: 0.5
    #[serde(default = "defaults::nms_radius")]
    pub nms_radius: f32,

    /// ...when their headings also differ by less than this (degrees).
    /// Default: 20.0
    #[serde(default = "defaults::nms_heading_deg")]
    pub nms_heading_deg: f32,

    /// Minimum refined fitness of a valid result (0..1).
    /// Default: 0.35
    #[serde(default = "defaults::min_fitness")]
    pub min_fitness: f32,

    /// Score candidates on the rayon pool.
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub use_parallel: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            strategy: CandidateStrategy::Grid,
            position_step: defaults::position_step(),
            heading_step_deg: defaults::heading_step_deg(),
            wall_clearance: defaults::wall_clearance(),
            guess_radius: defaults::guess_radius(),
            guess_position_step: defaults::guess_position_step(),
            guess_heading_window_deg: defaults::guess_heading_window_deg(),
            max_guess_particles: defaults::max_guess_particles(),
            scoring_points: defaults::scoring_points(),
            scoring_sigma: defaults::scoring_sigma(),
            fitness_sigma: defaults::fitness_sigma(),
            outside_penalty: defaults::outside_penalty(),
            outside_margin: defaults::outside_margin(),
            top_k: defaults::top_k(),
            nms_radius: defaults::nms_radius(),
            nms_heading_deg: defaults::nms_heading_deg(),
            min_fitness: defaults::min_fitness(),
            use_parallel: true,
        }
    }
}

impl GlobalConfig {
    /// Builder-style setter for the candidate strategy.
    pub fn with_strategy(mut self, strategy: CandidateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder-style setter for the grid resolution.
    pub fn with_grid_resolution(mut self, position_step: f32, heading_step_deg: f32) -> Self {
        self.position_step = position_step;
        self.heading_step_deg = heading_step_deg;
        self
    }

    /// Builder-style setter for parallel scoring.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.use_parallel = enabled;
        self
    }

    /// Check parameter ranges; returns the offending field on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.position_step <= 0.0 || self.guess_position_step <= 0.0 {
            return Err("global.position_step/guess_position_step".into());
        }
        if !(self.heading_step_deg > 0.0 && self.heading_step_deg <= 180.0) {
            return Err("global.heading_step_deg".into());
        }
        if self.scoring_sigma <= 0.0 || self.fitness_sigma <= 0.0 {
            return Err("global.scoring_sigma/fitness_sigma".into());
        }
        if self.top_k == 0 {
            return Err("global.top_k".into());
        }
        if !(0.0..=1.0).contains(&self.min_fitness) {
            return Err("global.min_fitness".into());
        }
        if let CandidateStrategy::Random { count: 0, .. } = self.strategy {
            return Err("global.strategy.count".into());
        }
        Ok(())
    }
}
