//! Scan preprocessing configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Which return survives when several rings land in one angular bin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSelection {
    /// Keep the return nearest the sensor (closest-wall assumption).
    #[default]
    Nearest,
    /// Keep the farthest return (sees past low clutter such as furniture).
    Farthest,
}

/// Configuration for [`ScanPreprocessor`](super::ScanPreprocessor).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessConfig {
    // === Clutter removal ===
    /// Sensor blanking distance (meters). Closer returns are discarded.
    /// Default: 0.4
    #[serde(default = "defaults::min_range")]
    pub min_range: f32,

    /// Maximum trusted planar range (meters).
    /// Default: 40.0
    #[serde(default = "defaults::max_range")]
    pub max_range: f32,

    /// Lowest kept height relative to the sensor (meters). Excludes floor.
    /// Default: -0.8
    #[serde(default = "defaults::min_z")]
    pub min_z: f32,

    /// Highest kept height relative to the sensor (meters). Excludes ceiling.
    /// Default: 1.2
    #[serde(default = "defaults::max_z")]
    pub max_z: f32,

    /// Neighbor distance gate at zero range (meters).
    /// Default: 0.2
    #[serde(default = "defaults::neighbor_distance_base")]
    pub neighbor_distance_base: f32,

    /// Neighbor distance gate growth per meter of range.
    /// Default: 0.02
    #[serde(default = "defaults::neighbor_distance_factor")]
    pub neighbor_distance_factor: f32,

    /// Minimum supporting neighbors among the 8 ring/column neighbors.
    /// Default: 2
    #[serde(default = "defaults::min_neighbors")]
    pub min_neighbors: usize,

    // === Projection ===
    /// Number of horizontal bins. 0 = one bin per scan column.
    #[serde(default)]
    pub angular_bins: usize,

    /// Per-bin selection policy.
    #[serde(default)]
    pub bin_selection: BinSelection,

    /// Bins on each side used to estimate local wall orientation.
    /// Default: 3
    #[serde(default = "defaults::orientation_window")]
    pub orientation_window: usize,

    /// Orientation neighbor gate at zero range (meters).
    /// Default: 0.25
    #[serde(default = "defaults::orientation_gate_base")]
    pub orientation_gate_base: f32,

    /// Orientation neighbor gate growth per meter of range.
    /// Default: 0.03
    #[serde(default = "defaults::orientation_gate_factor")]
    pub orientation_gate_factor: f32,

    /// Maximum minor/major eigenvalue ratio for a neighborhood to count as a line.
    /// Default: 0.05
    #[serde(default = "defaults::max_line_ratio")]
    pub max_line_ratio: f32,

    // === Corridor-aware downsampling ===
    // Orientation histogram settings live in `corridor` and are shared.
    /// Enable dropping redundant along-axis points in corridors.
    /// Default: true
    #[serde(default = "defaults::enabled")]
    pub downsample_enabled: bool,

    /// Corridorness above which downsampling starts (0..1).
    /// Default: 0.6
    #[serde(default = "defaults::corridorness_threshold")]
    pub corridorness_threshold: f32,

    /// Largest fraction of axis-aligned points dropped at corridorness 1.0.
    /// Default: 0.75
    #[serde(default = "defaults::max_drop_fraction")]
    pub max_drop_fraction: f32,

    /// Number of azimuth sectors with their own corridorness.
    /// Default: 8
    #[serde(default = "defaults::sectors")]
    pub sectors: usize,

    /// Fewer retained points than this marks the scan invalid.
    /// Default: 20
    #[serde(default = "defaults::min_points")]
    pub min_points: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            min_range: defaults::min_range(),
            max_range: defaults::max_range(),
            min_z: defaults::min_z(),
            max_z: defaults::max_z(),
            neighbor_distance_base: defaults::neighbor_distance_base(),
            neighbor_distance_factor: defaults::neighbor_distance_factor(),
            min_neighbors: defaults::min_neighbors(),
            angular_bins: 0,
            bin_selection: BinSelection::Nearest,
            orientation_window: defaults::orientation_window(),
            orientation_gate_base: defaults::orientation_gate_base(),
            orientation_gate_factor: defaults::orientation_gate_factor(),
            max_line_ratio: defaults::max_line_ratio(),
            downsample_enabled: true,
            corridorness_threshold: defaults::corridorness_threshold(),
            max_drop_fraction: defaults::max_drop_fraction(),
            sectors: defaults::sectors(),
            min_points: defaults::min_points(),
        }
    }
}

impl PreprocessConfig {
    /// Builder-style setter for the blanking distance.
    pub fn with_min_range(mut self, meters: f32) -> Self {
        self.min_range = meters;
        self
    }

    /// Builder-style setter for the height band.
    pub fn with_z_band(mut self, min_z: f32, max_z: f32) -> Self {
        self.min_z = min_z;
        self.max_z = max_z;
        self
    }

    /// Builder-style setter for the bin selection policy.
    pub fn with_bin_selection(mut self, selection: BinSelection) -> Self {
        self.bin_selection = selection;
        self
    }

    /// Builder-style switch for corridor downsampling.
    pub fn with_downsampling(mut self, enabled: bool) -> Self {
        self.downsample_enabled = enabled;
        self
    }

    /// Check parameter ranges; returns the offending field on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_range >= 0.0 && self.max_range > self.min_range) {
            return Err("preprocess.min_range/max_range".into());
        }
        if self.min_z >= self.max_z {
            return Err("preprocess.min_z/max_z".into());
        }
        if self.min_neighbors > 8 {
            return Err("preprocess.min_neighbors".into());
        }
        if !(0.0..=1.0).contains(&self.corridorness_threshold) {
            return Err("preprocess.corridorness_threshold".into());
        }
        if !(0.0..1.0).contains(&self.max_drop_fraction) {
            return Err("preprocess.max_drop_fraction".into());
        }
        if self.sectors == 0 {
            return Err("preprocess.sectors".into());
        }
        Ok(())
    }
}
