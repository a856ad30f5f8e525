//! Axis-aligned bounding box used for map extent and ray culling.

use super::point::Point2D;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Point2D,
    /// Maximum corner.
    pub max: Point2D,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// Create a box from its corners.
    #[inline]
    pub const fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// Empty box (min > max) that expands to fit the first point.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point2D::new(f32::INFINITY, f32::INFINITY),
            max: Point2D::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Tight box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand_to_include(*p);
        }
        bounds
    }

    /// True if no point has been included.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Width (x extent).
    #[inline]
    pub fn width(&self) -> f32 {
        (self.max.x - self.min.x).max(0.0)
    }

    /// Height (y extent).
    #[inline]
    pub fn height(&self) -> f32 {
        (self.max.y - self.min.y).max(0.0)
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow to include a point.
    #[inline]
    pub fn expand_to_include(&mut self, p: Point2D) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            Point2D::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point2D::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Parametric interval `[t_enter, t_exit]` over which the ray
    /// `origin + t * dir` (t ≥ 0) lies inside the box, or `None` if it misses.
    ///
    /// Slab test; axis-parallel rays are handled through infinite reciprocals.
    pub fn ray_interval(&self, origin: Point2D, dir: Point2D) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for (o, d, lo, hi) in [
            (origin.x, dir.x, self.min.x, self.max.x),
            (origin.y, dir.y, self.min.y, self.max.y),
        ] {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some((t_min, t_max))
    }
}
