//! Clutter removal over the organized ring/column structure.
//!
//! A return survives when it lies in the trusted range and height band and
//! enough of its 8 ring/column neighbors are close to it. Isolated returns
//! near the sensor are treated as noise, not walls.

use super::PreprocessStats;
use super::config::PreprocessConfig;
use crate::core::{Scan, ScanIndex};

/// Range and height gating. `true` = candidate for the density check.
pub(crate) fn gate_mask(scan: &Scan, config: &PreprocessConfig, stats: &mut PreprocessStats) -> Vec<bool> {
    scan.points()
        .iter()
        .map(|p| {
            if !p.is_valid() {
                stats.invalid_returns += 1;
                return false;
            }
            let r = p.planar_range();
            if r < config.min_range || r > config.max_range {
                stats.blanked += 1;
                return false;
            }
            if p.z < config.min_z || p.z > config.max_z {
                stats.out_of_band += 1;
                return false;
            }
            true
        })
        .collect()
}

/// Neighborhood density check. Returns the surviving mask.
pub(crate) fn density_filter(
    scan: &Scan,
    candidates: &[bool],
    config: &PreprocessConfig,
    stats: &mut PreprocessStats,
) -> Vec<bool> {
    let points = scan.points();
    let rings = scan.rings() as isize;

    let keep: Vec<bool> = (0..points.len())
        .map(|i| {
            if !candidates[i] {
                return false;
            }
            let p = &points[i];
            let gate = config.neighbor_distance_base + config.neighbor_distance_factor * p.range();
            let gate_sq = gate * gate;
            let ScanIndex { ring, column } = scan.index_of(i);

            let mut support = 0;
            for dr in -1isize..=1 {
                let r = ring as isize + dr;
                if r < 0 || r >= rings {
                    continue;
                }
                for dc in -1isize..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let c = scan.wrap_column(column, dc);
                    let j = scan.flat_index(ScanIndex::new(r as usize, c));
                    if j == i || !candidates[j] {
                        continue;
                    }
                    let q = &points[j];
                    let d_sq = (p.x - q.x).powi(2) + (p.y - q.y).powi(2) + (p.z - q.z).powi(2);
                    if d_sq <= gate_sq {
                        support += 1;
                    }
                }
            }
            support >= config.min_neighbors
        })
        .collect();

    stats.clutter += candidates
        .iter()
        .zip(&keep)
        .filter(|(c, k)| **c && !**k)
        .count();
    keep
}
