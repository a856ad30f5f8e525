//! Histogram of undirected wall orientations over [0, π).

use std::f32::consts::PI;

use crate::core::math::{normalize_orientation, orientation_diff};

/// Weighted histogram of line orientations.
///
/// Orientations are undirected: `a` and `a + π` fall into the same bin.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientationHistogram {
    bins: Vec<f32>,
    total: f32,
}

impl OrientationHistogram {
    /// Empty histogram with `bins` bins (at least 1).
    pub fn new(bins: usize) -> Self {
        Self {
            bins: vec![0.0; bins.max(1)],
            total: 0.0,
        }
    }

    /// Number of bins.
    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True when nothing has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total <= 0.0
    }

    /// Angular width of one bin.
    #[inline]
    pub fn bin_width(&self) -> f32 {
        PI / self.bins.len() as f32
    }

    /// Total accumulated weight.
    #[inline]
    pub fn total(&self) -> f32 {
        self.total
    }

    /// Raw bin weights.
    #[inline]
    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    /// Bin holding `orientation`.
    #[inline]
    pub fn bin_of(&self, orientation: f32) -> usize {
        let b = (normalize_orientation(orientation) / self.bin_width()) as usize;
        b.min(self.bins.len() - 1)
    }

    /// Center orientation of bin `i`.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f32 {
        (i as f32 + 0.5) * self.bin_width()
    }

    /// Accumulate `weight` at `orientation`.
    pub fn add(&mut self, orientation: f32, weight: f32) {
        if !orientation.is_finite() || weight <= 0.0 {
            return;
        }
        let b = self.bin_of(orientation);
        self.bins[b] += weight;
        self.total += weight;
    }

    /// Add another histogram's mass scaled by `scale`.
    ///
    /// Both histograms must have the same bin count; otherwise `other` is
    /// re-binned through its bin centers.
    pub fn merge(&mut self, other: &OrientationHistogram, scale: f32) {
        if scale <= 0.0 {
            return;
        }
        if other.len() == self.len() {
            for (dst, src) in self.bins.iter_mut().zip(&other.bins) {
                *dst += src * scale;
            }
            self.total += other.total * scale;
        } else {
            for (i, &w) in other.bins.iter().enumerate() {
                self.add(other.bin_center(i), w * scale);
            }
        }
    }

    /// Dominant orientation and the mass of its bin.
    ///
    /// Bins are compared after circular 3-bin smoothing so a wall split
    /// across a bin border still wins.
    pub fn peak(&self) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        let n = self.bins.len();
        let smoothed = |i: usize| {
            self.bins[(i + n - 1) % n] * 0.5 + self.bins[i] + self.bins[(i + 1) % n] * 0.5
        };
        let best = (0..n).max_by(|&a, &b| smoothed(a).total_cmp(&smoothed(b)))?;

        // Refine inside the winning neighborhood with a weighted mean of offsets.
        let mut sum_w = 0.0;
        let mut sum_off = 0.0;
        for k in [-1isize, 0, 1] {
            let j = (best as isize + k).rem_euclid(n as isize) as usize;
            sum_w += self.bins[j];
            sum_off += self.bins[j] * k as f32 * self.bin_width();
        }
        let center = if sum_w > 0.0 {
            normalize_orientation(self.bin_center(best) + sum_off / sum_w)
        } else {
            self.bin_center(best)
        };
        Some((center, self.bins[best]))
    }

    /// Mass within `half_window` of `orientation` (bin centers tested).
    pub fn mass_near(&self, orientation: f32, half_window: f32) -> f32 {
        let tol = half_window + 0.5 * self.bin_width();
        self.bins
            .iter()
            .enumerate()
            .filter(|(i, _)| orientation_diff(self.bin_center(*i), orientation) <= tol)
            .map(|(_, w)| *w)
            .sum()
    }

    /// Fraction of mass concentrated around the dominant orientation.
    ///
    /// Near 1.0 for a corridor (two parallel walls share one orientation),
    /// near 0.5 for a rectangular room, lower for cluttered space.
    pub fn concentration(&self, half_window: f32) -> f32 {
        match self.peak() {
            Some((orientation, _)) => {
                (self.mass_near(orientation, half_window) / self.total).clamp(0.0, 1.0)
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::deg_to_rad;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_wraps_half_turn() {
        let mut h = OrientationHistogram::new(36);
        h.add(0.2, 1.0);
        h.add(0.2 + PI, 1.0);
        assert_eq!(h.bins()[h.bin_of(0.2)], 2.0);
        assert_relative_eq!(h.total(), 2.0);
    }

    #[test]
    fn test_peak_finds_dominant() {
        let mut h = OrientationHistogram::new(36);
        for _ in 0..10 {
            h.add(deg_to_rad(42.0), 1.0);
        }
        h.add(deg_to_rad(130.0), 3.0);
        let (o, _) = h.peak().unwrap();
        assert!(orientation_diff(o, deg_to_rad(42.0)) < deg_to_rad(5.0));
    }

    #[test]
    fn test_concentration_corridor_vs_room() {
        let window = deg_to_rad(10.0);
        let mut corridor = OrientationHistogram::new(36);
        corridor.add(0.0, 90.0);
        corridor.add(PI / 2.0, 10.0);
        let mut room = OrientationHistogram::new(36);
        room.add(0.0, 50.0);
        room.add(PI / 2.0, 50.0);
        assert!(corridor.concentration(window) > 0.85);
        assert!(room.concentration(window) < 0.6);
    }

    #[test]
    fn test_merge_scaled() {
        let mut a = OrientationHistogram::new(18);
        a.add(0.1, 1.0);
        let mut b = OrientationHistogram::new(18);
        b.add(1.0, 4.0);
        a.merge(&b, 0.5);
        assert_relative_eq!(a.total(), 3.0);
        let coarse = OrientationHistogram::new(6);
        let mut c = coarse.clone();
        c.merge(&b, 1.0);
        assert_relative_eq!(c.total(), 4.0);
    }

    #[test]
    fn test_empty_has_no_peak() {
        let h = OrientationHistogram::new(10);
        assert!(h.peak().is_none());
        assert_eq!(h.concentration(0.1), 0.0);
    }
}
