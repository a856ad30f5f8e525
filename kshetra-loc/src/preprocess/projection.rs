//! Top-down angular projection ("scan image") and local wall orientation.

use std::f32::consts::PI;

use super::ProcessedPoint;
use super::config::{BinSelection, PreprocessConfig};
use crate::core::math::normalize_orientation;
use crate::core::{Point2D, Scan};

/// Collapse retained returns into one point per horizontal bin.
///
/// Output is ordered by bin (counter-clockwise azimuth); empty bins are
/// skipped.
pub(crate) fn project(scan: &Scan, keep: &[bool], config: &PreprocessConfig) -> Vec<ProcessedPoint> {
    let bins = if config.angular_bins == 0 {
        scan.columns()
    } else {
        config.angular_bins
    };
    let mut slots: Vec<Option<ProcessedPoint>> = vec![None; bins];

    for (i, (index, p)) in scan.iter_indexed().enumerate() {
        if !keep[i] {
            continue;
        }
        let bin = if config.angular_bins == 0 {
            index.column
        } else {
            let a = p.azimuth() + PI;
            ((a / (2.0 * PI) * bins as f32) as usize) % bins
        };
        let range = p.planar_range();
        let replace = match &slots[bin] {
            None => true,
            Some(current) => match config.bin_selection {
                BinSelection::Nearest => range < current.range,
                BinSelection::Farthest => range > current.range,
            },
        };
        if replace {
            slots[bin] = Some(ProcessedPoint {
                point: p.planar(),
                range,
                index,
                z: p.z,
                intensity: p.intensity,
                orientation: None,
            });
        }
    }

    slots.into_iter().flatten().collect()
}

/// Estimate the orientation of the wall each point lies on.
///
/// Principal-axis fit over the point and its `orientation_window` neighbors
/// on each side (wrapping in azimuth), gated by distance. Neighborhoods
/// that are not line-like leave the orientation unset.
pub(crate) fn estimate_orientations(points: &mut [ProcessedPoint], config: &PreprocessConfig) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let w = config.orientation_window.min((n - 1) / 2) as isize;

    let orientations: Vec<Option<f32>> = (0..n)
        .map(|i| {
            let center = points[i].point;
            let gate = config.orientation_gate_base + config.orientation_gate_factor * points[i].range;
            let gate_sq = gate * gate;

            let neighborhood: Vec<Point2D> = (-w..=w)
                .map(|k| points[(i as isize + k).rem_euclid(n as isize) as usize].point)
                .filter(|p| p.distance_squared(center) <= gate_sq)
                .collect();
            line_orientation(&neighborhood, config.max_line_ratio)
        })
        .collect();

    for (p, o) in points.iter_mut().zip(orientations) {
        p.orientation = o;
    }
}

/// Orientation of the best-fit line through `points`, if they are line-like.
pub(crate) fn line_orientation(points: &[Point2D], max_ratio: f32) -> Option<f32> {
    if points.len() < 3 {
        return None;
    }
    let inv_n = 1.0 / points.len() as f32;
    let mean = points.iter().fold(Point2D::ZERO, |acc, &p| acc + p) * inv_n;

    let (mut cxx, mut cyy, mut cxy) = (0.0f32, 0.0f32, 0.0f32);
    for p in points {
        let d = *p - mean;
        cxx += d.x * d.x;
        cyy += d.y * d.y;
        cxy += d.x * d.y;
    }
    cxx *= inv_n;
    cyy *= inv_n;
    cxy *= inv_n;

    let trace = cxx + cyy;
    let det = cxx * cyy - cxy * cxy;
    let disc = ((trace * trace) * 0.25 - det).max(0.0).sqrt();
    let major = trace * 0.5 + disc;
    let minor = (trace * 0.5 - disc).max(0.0);
    if major <= f32::EPSILON || minor > max_ratio * major {
        return None;
    }
    Some(normalize_orientation(0.5 * (2.0 * cxy).atan2(cxx - cyy)))
}
