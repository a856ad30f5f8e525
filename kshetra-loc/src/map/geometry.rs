//! Polygon queries shared by every component that touches the map.
//!
//! [`PolygonGeometry`] is implemented once for [`Area`](super::Area) and for
//! raw vertex slices; global search, pose tracking and area tracking all go
//! through it instead of carrying their own point-in-polygon or ray code.

use crate::core::{Bounds, Point2D};

/// Parallel-ray threshold for the segment intersection denominator.
const PARALLEL_EPS: f32 = 1e-9;

/// Slack on the segment parameter so rays through a shared vertex hit both edges.
const SEGMENT_EPS: f32 = 1e-5;

/// Slack on the side-of-ray cull for the same reason.
const SIDE_EPS: f32 = 1e-6;

/// Intersection of a ray with one polygon edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeHit {
    /// Edge index (edge `i` runs from vertex `i` to vertex `i + 1`).
    pub edge: usize,
    /// Ray parameter; equals the range for a unit direction.
    pub t: f32,
    /// Position along the edge in [0, 1].
    pub s: f32,
    /// Intersection point.
    pub point: Point2D,
}

/// Intersect the ray `origin + t * dir` (t ≥ 0) with segment `a → b`.
///
/// Returns `(t, s)` where `s` parameterises the segment. Parallel and
/// collinear configurations count as a miss. Swapping `a` and `b` yields
/// the same `t` and `1 - s`. Endpoints are hit inclusively with a small slack.
#[inline]
pub fn ray_segment_intersection(
    origin: Point2D,
    dir: Point2D,
    a: Point2D,
    b: Point2D,
) -> Option<(f32, f32)> {
    let seg = b - a;
    let denom = dir.cross(seg);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let w = a - origin;
    let t = w.cross(seg) / denom;
    let s = w.cross(dir) / denom;
    if t >= 0.0 && (-SEGMENT_EPS..=1.0 + SEGMENT_EPS).contains(&s) {
        Some((t, s.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// True when segments `p1 → p2` and `q1 → q2` share at least one point.
pub fn segments_intersect(p1: Point2D, p2: Point2D, q1: Point2D, q2: Point2D) -> bool {
    let d1 = (q2 - q1).cross(p1 - q1);
    let d2 = (q2 - q1).cross(p2 - q1);
    let d3 = (p2 - p1).cross(q1 - p1);
    let d4 = (p2 - p1).cross(q2 - p1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |a: Point2D, b: Point2D, p: Point2D| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Distance from `p` to segment `a → b` and the clamped projection parameter.
#[inline]
pub fn point_segment_distance(p: Point2D, a: Point2D, b: Point2D) -> (f32, f32) {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < f32::EPSILON {
        return (p.distance(a), 0.0);
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    (p.distance(a + seg * t), t)
}

/// Geometric queries over a closed polygon.
///
/// Implementors provide vertices; everything else has a default
/// implementation. Vertices are expected counter-clockwise so the interior
/// lies to the left of every edge.
pub trait PolygonGeometry {
    /// Number of vertices (equals the number of edges).
    fn vertex_count(&self) -> usize;

    /// Vertex `i`.
    fn vertex(&self, i: usize) -> Point2D;

    /// Bounding box of the polygon.
    fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for i in 0..self.vertex_count() {
            b.expand_to_include(self.vertex(i));
        }
        b
    }

    /// Endpoints of edge `i`.
    #[inline]
    fn edge(&self, i: usize) -> (Point2D, Point2D) {
        let n = self.vertex_count();
        (self.vertex(i % n), self.vertex((i + 1) % n))
    }

    /// Shoelace area; positive for counter-clockwise order.
    fn signed_area(&self) -> f32 {
        let n = self.vertex_count();
        let mut sum = 0.0;
        for i in 0..n {
            let (a, b) = self.edge(i);
            sum += a.cross(b);
        }
        sum * 0.5
    }

    /// Point-in-polygon by crossing number with a half-open rule.
    ///
    /// Each edge is evaluated from its lower endpoint so both polygons that
    /// share an edge compute the identical crossing. Points on left or bottom
    /// boundaries are inside, points on right or top boundaries are outside.
    fn contains(&self, p: Point2D) -> bool {
        if !self.bounds().contains(p) {
            return false;
        }
        let mut inside = false;
        for i in 0..self.vertex_count() {
            let (a, b) = self.edge(i);
            if (a.y > p.y) == (b.y > p.y) {
                continue;
            }
            let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
            let x_cross = if hi.x == lo.x {
                lo.x
            } else {
                lo.x + (p.y - lo.y) * (hi.x - lo.x) / (hi.y - lo.y)
            };
            if p.x < x_cross {
                inside = !inside;
            }
        }
        inside
    }

    /// Nearest forward intersection of a ray with any edge, within `max_range`.
    ///
    /// `dir` must be a unit vector. Edges entirely on one side of the ray's
    /// supporting line or entirely behind the origin are rejected before the
    /// exact segment test.
    fn cast_ray(&self, origin: Point2D, dir: Point2D, max_range: f32) -> Option<EdgeHit> {
        self.bounds().ray_interval(origin, dir)?;
        let mut best: Option<EdgeHit> = None;
        for i in 0..self.vertex_count() {
            if let Some(hit) = cast_ray_edge(self, i, origin, dir) {
                let closer = best.map_or(true, |b| hit.t < b.t);
                if hit.t <= max_range && closer {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Edge closest to `p`, with its distance.
    fn nearest_edge(&self, p: Point2D) -> Option<(usize, f32)> {
        (0..self.vertex_count())
            .map(|i| {
                let (a, b) = self.edge(i);
                (i, point_segment_distance(p, a, b).0)
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
    }
}

/// Culled intersection of a ray with one edge of a polygon.
#[inline]
pub fn cast_ray_edge<P: PolygonGeometry + ?Sized>(
    polygon: &P,
    edge: usize,
    origin: Point2D,
    dir: Point2D,
) -> Option<EdgeHit> {
    let (a, b) = polygon.edge(edge);
    let (oa, ob) = (a - origin, b - origin);
    let (sa, sb) = (dir.cross(oa), dir.cross(ob));
    if (sa > SIDE_EPS && sb > SIDE_EPS) || (sa < -SIDE_EPS && sb < -SIDE_EPS) {
        return None;
    }
    if dir.dot(oa) < 0.0 && dir.dot(ob) < 0.0 {
        return None;
    }
    let (t, s) = ray_segment_intersection(origin, dir, a, b)?;
    Some(EdgeHit {
        edge,
        t,
        s,
        point: origin + dir * t,
    })
}

impl PolygonGeometry for [Point2D] {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn vertex(&self, i: usize) -> Point2D {
        self[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 4.0),
            Point2D::new(0.0, 4.0),
        ]
    }

    fn l_shape() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(6.0, 0.0),
            Point2D::new(6.0, 2.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 6.0),
            Point2D::new(0.0, 6.0),
        ]
    }

    #[test]
    fn test_contains_strict_interior_and_exterior() {
        let poly = l_shape();
        for p in [(1.0, 1.0), (5.0, 1.5), (1.0, 5.0), (1.9, 1.9)] {
            assert!(PolygonGeometry::contains(poly.as_slice(), Point2D::new(p.0, p.1)), "{:?} should be inside", p);
        }
        for p in [(3.0, 3.0), (5.0, 5.0), (-0.5, 1.0), (7.0, 1.0), (1.0, 6.5)] {
            assert!(!PolygonGeometry::contains(poly.as_slice(), Point2D::new(p.0, p.1)), "{:?} should be outside", p);
        }
    }

    #[test]
    fn test_boundary_tie_break() {
        let poly = square();
        assert!(PolygonGeometry::contains(poly.as_slice(), Point2D::new(0.0, 2.0)), "left edge inside");
        assert!(PolygonGeometry::contains(poly.as_slice(), Point2D::new(2.0, 0.0)), "bottom edge inside");
        assert!(!PolygonGeometry::contains(poly.as_slice(), Point2D::new(4.0, 2.0)), "right edge outside");
        assert!(!PolygonGeometry::contains(poly.as_slice(), Point2D::new(2.0, 4.0)), "top edge outside");
    }

    #[test]
    fn test_shared_edge_owned_once() {
        let left = square();
        let right: Vec<Point2D> = square()
            .iter()
            .map(|p| Point2D::new(p.x + 4.0, p.y))
            .collect();
        for i in 0..=20 {
            let p = Point2D::new(4.0, 0.2 * i as f32 - 0.01);
            let owners = [PolygonGeometry::contains(left.as_slice(), p), PolygonGeometry::contains(right.as_slice(), p)]
                .iter()
                .filter(|&&c| c)
                .count();
            if p.y >= 0.0 && p.y < 4.0 {
                assert_eq!(owners, 1, "point {:?}", p);
            }
        }
    }

    #[test]
    fn test_signed_area_orientation() {
        let mut poly = square();
        assert_relative_eq!(poly.signed_area(), 16.0);
        poly.reverse();
        assert_relative_eq!(poly.signed_area(), -16.0);
    }

    #[test]
    fn test_ray_segment_symmetric_under_reversal() {
        let o = Point2D::new(0.3, -0.7);
        let d = Point2D::new(0.6, 0.8);
        let a = Point2D::new(-2.0, 3.0);
        let b = Point2D::new(5.0, 1.0);
        let (t1, s1) = ray_segment_intersection(o, d, a, b).unwrap();
        let (t2, s2) = ray_segment_intersection(o, d, b, a).unwrap();
        assert_relative_eq!(t1, t2, epsilon = 1e-5);
        assert_relative_eq!(s1, 1.0 - s2, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_segment_rigid_invariance() {
        let pose = crate::core::Pose2D::new(3.0, -2.0, 1.1);
        let o = Point2D::new(0.0, 0.0);
        let d = Point2D::new(1.0, 0.0);
        let a = Point2D::new(2.0, -1.0);
        let b = Point2D::new(2.5, 1.0);
        let (t1, _) = ray_segment_intersection(o, d, a, b).unwrap();
        let (t2, _) = ray_segment_intersection(
            pose.transform_point(o),
            pose.rotate_vector(d),
            pose.transform_point(a),
            pose.transform_point(b),
        )
        .unwrap();
        assert_relative_eq!(t1, t2, epsilon = 1e-4);
    }

    #[test]
    fn test_ray_misses_behind_and_parallel() {
        let o = Point2D::new(0.0, 0.0);
        let d = Point2D::new(1.0, 0.0);
        assert!(ray_segment_intersection(o, d, Point2D::new(-1.0, -1.0), Point2D::new(-1.0, 1.0)).is_none());
        assert!(ray_segment_intersection(o, d, Point2D::new(1.0, 1.0), Point2D::new(3.0, 1.0)).is_none());
    }

    #[test]
    fn test_cast_ray_nearest_edge() {
        let poly = square();
        let hit = poly
            .cast_ray(Point2D::new(1.0, 2.0), Point2D::new(1.0, 0.0), 100.0)
            .unwrap();
        assert_eq!(hit.edge, 1);
        assert_relative_eq!(hit.t, 3.0, epsilon = 1e-6);
        assert!(poly.cast_ray(Point2D::new(1.0, 2.0), Point2D::new(1.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_segments_intersect() {
        let p = |x, y| Point2D::new(x, y);
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)));
    }

    #[test]
    fn test_nearest_edge() {
        let (edge, dist) = square().nearest_edge(Point2D::new(3.5, 2.0)).unwrap();
        assert_eq!(edge, 1);
        assert_relative_eq!(dist, 0.5, epsilon = 1e-6);
    }
}
