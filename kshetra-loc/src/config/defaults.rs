//! Default value functions for serde deserialization.

// Shared

pub fn enabled() -> bool {
    true
}

pub fn histogram_bins() -> usize {
    36
}

pub fn peak_window_deg() -> f32 {
    10.0
}

pub fn alignment_tolerance_deg() -> f32 {
    15.0
}

pub fn map_histogram_weight() -> f32 {
    0.3
}

// Preprocessing

pub fn min_range() -> f32 {
    0.4
}

pub fn max_range() -> f32 {
    40.0
}

pub fn min_z() -> f32 {
    -0.8
}

pub fn max_z() -> f32 {
    1.2
}

pub fn neighbor_distance_base() -> f32 {
    0.2
}

pub fn neighbor_distance_factor() -> f32 {
    0.02
}

pub fn min_neighbors() -> usize {
    2
}

pub fn orientation_window() -> usize {
    3
}

pub fn orientation_gate_base() -> f32 {
    0.25
}

pub fn orientation_gate_factor() -> f32 {
    0.03
}

pub fn max_line_ratio() -> f32 {
    0.05
}

pub fn corridorness_threshold() -> f32 {
    0.6
}

pub fn max_drop_fraction() -> f32 {
    0.75
}

pub fn sectors() -> usize {
    8
}

pub fn min_points() -> usize {
    20
}

// Corridor weighting

pub fn axis_weight() -> f32 {
    0.2
}

pub fn cross_share() -> f32 {
    0.3
}

pub fn max_cross_weight() -> f32 {
    5.0
}

// Ray intersection

pub fn ray_max_range() -> f32 {
    60.0
}

pub fn max_passage_hops() -> usize {
    8
}

pub fn tie_epsilon() -> f32 {
    1e-4
}

// Global localization

pub fn position_step() -> f32 {
    0.4
}

pub fn heading_step_deg() -> f32 {
    10.0
}

pub fn wall_clearance() -> f32 {
    0.2
}

pub fn guess_radius() -> f32 {
    1.0
}

pub fn guess_position_step() -> f32 {
    0.2
}

pub fn guess_heading_window_deg() -> f32 {
    30.0
}

pub fn max_guess_particles() -> usize {
    32
}

pub fn scoring_points() -> usize {
    120
}

pub fn scoring_sigma() -> f32 {
    0.4
}

pub fn fitness_sigma() -> f32 {
    0.1
}

pub fn outside_penalty() -> f32 {
    0.5
}

pub fn outside_margin() -> f32 {
    0.3
}

pub fn top_k() -> usize {
    12
}

pub fn nms_radius() -> f32 {
    0.5
}

pub fn nms_heading_deg() -> f32 {
    20.0
}

pub fn min_fitness() -> f32 {
    0.35
}

// Pose tracking

pub fn max_iterations() -> usize {
    30
}

pub fn translation_epsilon() -> f32 {
    0.001
}

pub fn rotation_epsilon() -> f32 {
    0.001
}

pub fn outlier_threshold() -> f32 {
    0.5
}

pub fn min_outlier_threshold() -> f32 {
    0.1
}

pub fn outlier_decay() -> f32 {
    0.8
}

pub fn damping() -> f32 {
    0.05
}

pub fn min_correspondences() -> usize {
    15
}

pub fn divergence_patience() -> usize {
    3
}

pub fn min_incidence_weight() -> f32 {
    0.2
}

pub fn confidence_sigma() -> f32 {
    0.05
}

pub fn unconverged_penalty() -> f32 {
    0.5
}

pub fn max_step_translation() -> f32 {
    0.5
}

pub fn max_step_rotation() -> f32 {
    0.2
}

// Area tracking

pub fn max_hops() -> usize {
    2
}

// Pipeline

pub fn fallback_patience() -> usize {
    3
}

pub fn min_confidence() -> f32 {
    0.2
}
