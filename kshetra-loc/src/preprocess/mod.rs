//! Scan preprocessing: clutter removal, projection, corridor-aware downsampling.
//!
//! ```text
//!   Scan (rings x columns, 3D)
//!     │  range / height gating        clutter.rs
//!     │  ring/column density check    clutter.rs
//!     ▼
//!   one point per azimuth bin         projection.rs
//!     │  local wall orientation (PCA)
//!     ▼
//!   orientation histogram ──(+ map histogram from last frame)
//!     │  corridorness, dominant orientation, per-sector corridorness
//!     ▼
//!   drop redundant along-axis points  downsample.rs
//!     ▼
//!   ProcessedScan
//! ```
//!
//! A scan left with fewer than `min_points` points is flagged invalid; the
//! pipeline skips such frames and keeps its previous state.

mod clutter;
mod config;
mod downsample;
mod projection;

pub use config::{BinSelection, PreprocessConfig};
pub use downsample::corridorness_drop_rate;

use crate::core::{Point2D, Scan, ScanIndex};
use crate::corridor::{CorridorConfig, CorridorFeedback, CorridornessOptimizer, OrientationHistogram};

/// One projected point in the sensor frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedPoint {
    /// Planar position in the sensor frame (meters).
    pub point: Point2D,
    /// Planar range from the sensor (meters).
    pub range: f32,
    /// Originating ring and column.
    pub index: ScanIndex,
    /// Height relative to the sensor (meters).
    pub z: f32,
    /// Return intensity.
    pub intensity: f32,
    /// Local wall orientation in [0, π), if the neighborhood is line-like.
    pub orientation: Option<f32>,
}

impl ProcessedPoint {
    /// Azimuth of the point in the sensor frame.
    #[inline]
    pub fn bearing(&self) -> f32 {
        self.point.angle()
    }

    /// Unit bearing vector in the sensor frame.
    #[inline]
    pub fn direction(&self) -> Point2D {
        self.point.normalized()
    }
}

/// Per-stage counters for one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    /// Slots in the organized buffer.
    pub input_points: usize,
    /// Non-finite returns.
    pub invalid_returns: usize,
    /// Outside the trusted range.
    pub blanked: usize,
    /// Outside the height band.
    pub out_of_band: usize,
    /// Failed the density check.
    pub clutter: usize,
    /// Points after projection.
    pub projected: usize,
    /// Dropped by corridor downsampling.
    pub dropped: usize,
}

/// Filtered, projected and downsampled scan.
#[derive(Clone, Debug)]
pub struct ProcessedScan {
    /// Sequence number of the source scan.
    pub sequence: u64,
    /// Timestamp of the source scan (microseconds).
    pub stamp_us: u64,
    /// Retained points, ordered by azimuth bin.
    pub points: Vec<ProcessedPoint>,
    /// Which projected points survived downsampling.
    pub retained: Vec<bool>,
    /// Orientation histogram of the projected points alone.
    pub scan_histogram: OrientationHistogram,
    /// `scan_histogram` with the previous frame's map hint merged in.
    pub histogram: OrientationHistogram,
    /// Share of orientation mass around the dominant orientation (0..1).
    pub corridorness: f32,
    /// Dominant wall orientation in the sensor frame, [0, π).
    pub dominant_orientation: Option<f32>,
    /// Corridorness of each azimuth sector.
    pub sector_corridorness: Vec<f32>,
    /// Stage counters.
    pub stats: PreprocessStats,
    /// False when too few points remain; such frames are skipped.
    pub valid: bool,
}

impl ProcessedScan {
    /// Number of retained points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point was retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evenly spaced subset of at most `max` point indices.
    pub fn subsample_indices(&self, max: usize) -> Vec<usize> {
        let n = self.points.len();
        if max == 0 || n <= max {
            return (0..n).collect();
        }
        (0..max).map(|k| k * n / max).collect()
    }
}

/// Turns raw organized scans into [`ProcessedScan`]s.
///
/// Orientation histogram settings (bins, peak window, alignment tolerance,
/// map hint weight) come from the [`CorridorConfig`], shared with the
/// [`CorridornessOptimizer`] that weights the same scan later.
#[derive(Clone, Debug, Default)]
pub struct ScanPreprocessor {
    config: PreprocessConfig,
    corridor: CorridornessOptimizer,
}

impl ScanPreprocessor {
    /// Create a preprocessor with default corridor settings.
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            corridor: CorridornessOptimizer::default(),
        }
    }

    /// Builder-style setter for the orientation histogram settings.
    pub fn with_corridor(mut self, corridor: CorridorConfig) -> Self {
        self.corridor = CorridornessOptimizer::new(corridor);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Process one sweep.
    ///
    /// `feedback` carries the current area's wall-orientation histogram in
    /// the sensor frame, as of the previous frame.
    pub fn process(&self, scan: &Scan, feedback: Option<&CorridorFeedback>) -> ProcessedScan {
        let config = &self.config;
        let mut stats = PreprocessStats {
            input_points: scan.len(),
            ..PreprocessStats::default()
        };

        let candidates = clutter::gate_mask(scan, config, &mut stats);
        let keep = clutter::density_filter(scan, &candidates, config, &mut stats);

        let mut projected = projection::project(scan, &keep, config);
        projection::estimate_orientations(&mut projected, config);
        stats.projected = projected.len();

        let scan_histogram = self.corridor.scan_histogram(&projected);
        let map_hint = feedback.and_then(|f| f.map_histogram.as_ref());
        let histogram = self.corridor.merge_map_histogram(&scan_histogram, map_hint);
        let (corridorness, dominant_orientation) = self.corridor.corridorness(&histogram);
        let tolerance = self.corridor.alignment_tolerance();
        let sector_corridorness =
            downsample::sector_corridorness(&projected, dominant_orientation, tolerance, config);
        let retained = downsample::downsample(
            &projected,
            corridorness,
            dominant_orientation,
            &sector_corridorness,
            tolerance,
            config,
        );

        let points: Vec<ProcessedPoint> = projected
            .into_iter()
            .zip(&retained)
            .filter_map(|(p, &k)| k.then_some(p))
            .collect();
        stats.dropped = stats.projected - points.len();

        let valid = points.len() >= config.min_points;
        if !valid {
            log::warn!(
                "Scan {} degenerate: {} points retained (need {}), {:?}",
                scan.sequence,
                points.len(),
                config.min_points,
                stats
            );
        } else {
            log::trace!(
                "Scan {}: {} -> {} projected -> {} retained, corridorness {:.2}",
                scan.sequence,
                stats.input_points,
                stats.projected,
                points.len(),
                corridorness
            );
        }

        ProcessedScan {
            sequence: scan.sequence,
            stamp_us: scan.stamp_us,
            points,
            retained,
            scan_histogram,
            histogram,
            corridorness,
            dominant_orientation,
            sector_corridorness,
            stats,
            valid,
        }
    }
}
