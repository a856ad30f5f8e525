//! Corridor-aware downsampling.
//!
//! In a corridor most projected points sit on the two side walls and only
//! constrain the cross-axis position. A fraction of those axis-aligned points
//! is dropped per sector; points on crossing surfaces are always kept.

use std::f32::consts::PI;

use super::ProcessedPoint;
use super::config::PreprocessConfig;
use crate::core::math::orientation_diff;

/// Fraction of axis-aligned points to drop for a given corridorness.
///
/// Zero below `threshold`, rising linearly to `max_drop` at corridorness 1.
///
/// ```
/// use kshetra_loc::preprocess::corridorness_drop_rate;
///
/// assert_eq!(corridorness_drop_rate(0.5, 0.6, 0.75), 0.0);
/// assert!((corridorness_drop_rate(1.0, 0.6, 0.75) - 0.75).abs() < 1e-6);
/// ```
pub fn corridorness_drop_rate(corridorness: f32, threshold: f32, max_drop: f32) -> f32 {
    if corridorness < threshold || threshold >= 1.0 {
        return 0.0;
    }
    let s = ((corridorness - threshold) / (1.0 - threshold)).clamp(0.0, 1.0);
    (s * max_drop).clamp(0.0, max_drop)
}

/// Sector of a bearing among `sectors` equal azimuth slices.
#[inline]
pub(crate) fn sector_of(bearing: f32, sectors: usize) -> usize {
    (((bearing + PI) / (2.0 * PI) * sectors as f32) as usize) % sectors
}

/// Per-sector share of oriented points within `tol` of `dominant`.
pub(crate) fn sector_corridorness(
    points: &[ProcessedPoint],
    dominant: Option<f32>,
    tol: f32,
    config: &PreprocessConfig,
) -> Vec<f32> {
    let mut aligned = vec![0usize; config.sectors];
    let mut oriented = vec![0usize; config.sectors];
    let Some(dominant) = dominant else {
        return vec![0.0; config.sectors];
    };

    for p in points {
        let Some(o) = p.orientation else { continue };
        let s = sector_of(p.bearing(), config.sectors);
        oriented[s] += 1;
        if orientation_diff(o, dominant) <= tol {
            aligned[s] += 1;
        }
    }
    aligned
        .iter()
        .zip(&oriented)
        .map(|(&a, &o)| if o < 3 { 0.0 } else { a as f32 / o as f32 })
        .collect()
}

/// Retained mask over `points`.
///
/// Nothing is dropped when the scan is not corridor-like, when no dominant
/// orientation exists, or when dropping would leave fewer than
/// `min_points` points.
pub(crate) fn downsample(
    points: &[ProcessedPoint],
    corridorness: f32,
    dominant: Option<f32>,
    sectors: &[f32],
    tol: f32,
    config: &PreprocessConfig,
) -> Vec<bool> {
    let mut keep = vec![true; points.len()];
    let Some(dominant) = dominant else {
        return keep;
    };
    if !config.downsample_enabled || corridorness < config.corridorness_threshold {
        return keep;
    }

    let strides: Vec<usize> = sectors
        .iter()
        .map(|&c| {
            let rate = corridorness_drop_rate(c, config.corridorness_threshold, config.max_drop_fraction);
            (1.0 / (1.0 - rate)).round().max(1.0) as usize
        })
        .collect();
    let mut counters = vec![0usize; sectors.len()];

    for (p, k) in points.iter().zip(keep.iter_mut()) {
        let Some(o) = p.orientation else { continue };
        if orientation_diff(o, dominant) > tol {
            continue;
        }
        let s = sector_of(p.bearing(), sectors.len());
        *k = counters[s] % strides[s] == 0;
        counters[s] += 1;
    }

    if keep.iter().filter(|&&k| k).count() < config.min_points {
        keep.iter_mut().for_each(|k| *k = true);
    }
    keep
}
