//! Ray casting against area boundaries with passage continuation.

use rayon::prelude::*;

use super::config::IntersectConfig;
use crate::core::{Point2D, Pose2D};
use crate::map::{
    AreaGraphMap, AreaId, EdgeHit, EdgeKind, EdgeRef, PassageTarget, PolygonGeometry, cast_ray_edge,
};
use crate::preprocess::ProcessedPoint;

/// Shared-vertex tolerance when skipping the passage a ray entered through.
const ENTRY_EPS: f32 = 1e-4;

/// Below this many rays a batch is cast sequentially.
const PARALLEL_MIN_BATCH: usize = 64;

/// Result of casting one ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// A wall was hit within range.
    pub hit: bool,
    /// Distance from the ray origin to the wall (meters); infinite on a miss.
    pub range: f32,
    /// Hit point in the map frame.
    pub point: Point2D,
    /// Wall edge that was hit.
    pub edge: Option<EdgeRef>,
    /// Area the ray ended in.
    pub area: AreaId,
    /// Number of passages the ray passed through.
    pub passages_crossed: usize,
}

impl RayHit {
    /// A miss that ended in `area`.
    #[inline]
    pub fn miss(area: AreaId, passages_crossed: usize) -> Self {
        Self {
            hit: false,
            range: f32::INFINITY,
            point: Point2D::new(f32::NAN, f32::NAN),
            edge: None,
            area,
            passages_crossed,
        }
    }
}

/// Casts bearing rays from a sensor pose against the Area Graph.
///
/// Rays start in one area and are tested against its boundary. A ray
/// leaving through a passage continues into the neighbor, so passages are
/// never reported as walls; exterior passages and exhausted hop budgets end
/// in a miss.
#[derive(Clone, Copy, Debug)]
pub struct RayMapIntersector<'a> {
    map: &'a AreaGraphMap,
    config: IntersectConfig,
}

impl<'a> RayMapIntersector<'a> {
    /// Create an intersector over `map`.
    pub fn new(map: &'a AreaGraphMap, config: IntersectConfig) -> Self {
        Self { map, config }
    }

    /// Underlying map.
    #[inline]
    pub fn map(&self) -> &'a AreaGraphMap {
        self.map
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &IntersectConfig {
        &self.config
    }

    /// Area that actually contains `origin`, starting the search at `hint`.
    ///
    /// Checks the hint, then its neighbors, then the whole map.
    pub fn resolve_area(&self, origin: Point2D, hint: AreaId) -> Option<AreaId> {
        if self.map.area(hint).is_some_and(|a| a.contains(origin)) {
            return Some(hint);
        }
        for id in self.map.neighbors(hint) {
            if self.map.area(id).is_some_and(|a| a.contains(origin)) {
                return Some(id);
            }
        }
        self.map.locate(origin)
    }

    /// Cast the bearing of a sensor-frame point from `pose`, starting in `area`.
    #[inline]
    pub fn intersect(&self, point: &ProcessedPoint, pose: Pose2D, area: AreaId) -> RayHit {
        self.cast(pose.position(), pose.rotate_vector(point.direction()), area)
    }

    /// Cast every point of a batch. Order of results matches `points`.
    pub fn intersect_all(&self, points: &[ProcessedPoint], pose: Pose2D, area: AreaId) -> Vec<RayHit> {
        if self.config.use_parallel && points.len() >= PARALLEL_MIN_BATCH {
            points
                .par_iter()
                .map(|p| self.intersect(p, pose, area))
                .collect()
        } else {
            points.iter().map(|p| self.intersect(p, pose, area)).collect()
        }
    }

    /// Cast a ray with unit direction `dir` from `origin`, which lies in `area`.
    pub fn cast(&self, origin: Point2D, dir: Point2D, area: AreaId) -> RayHit {
        let eps = self.config.tie_epsilon;
        let mut current = area;
        let mut t_floor = 0.0f32;
        let mut entry: Option<(Point2D, Point2D)> = None;
        let mut crossed = 0;

        loop {
            let Some(polygon) = self.map.area(current) else {
                return RayHit::miss(current, crossed);
            };
            if polygon.bounds().ray_interval(origin, dir).is_none() {
                return RayHit::miss(current, crossed);
            }

            let mut best: Option<(EdgeHit, EdgeKind)> = None;
            for i in 0..polygon.vertex_count() {
                if let Some((ea, eb)) = entry {
                    let (a, b) = polygon.edge(i);
                    let same = (a.distance(eb) < ENTRY_EPS && b.distance(ea) < ENTRY_EPS)
                        || (a.distance(ea) < ENTRY_EPS && b.distance(eb) < ENTRY_EPS);
                    if same {
                        continue;
                    }
                }
                let Some(hit) = cast_ray_edge(polygon, i, origin, dir) else {
                    continue;
                };
                if hit.t < t_floor - eps || hit.t > self.config.max_range {
                    continue;
                }
                let kind = polygon.edge_kind(i);
                let better = match &best {
                    None => true,
                    Some((b, b_kind)) => {
                        if (hit.t - b.t).abs() <= eps {
                            (kind.is_wall() && !b_kind.is_wall())
                                || (kind.is_wall() == b_kind.is_wall() && hit.t < b.t)
                        } else {
                            hit.t < b.t
                        }
                    }
                };
                if better {
                    best = Some((hit, kind));
                }
            }

            let Some((hit, kind)) = best else {
                return RayHit::miss(current, crossed);
            };
            match kind {
                EdgeKind::Wall => {
                    return RayHit {
                        hit: true,
                        range: hit.t,
                        point: hit.point,
                        edge: Some(EdgeRef {
                            area: current,
                            edge: hit.edge,
                        }),
                        area: current,
                        passages_crossed: crossed,
                    };
                }
                EdgeKind::Passage(PassageTarget::Exterior) => {
                    return RayHit::miss(current, crossed);
                }
                EdgeKind::Passage(PassageTarget::Area(next)) => {
                    crossed += 1;
                    if crossed > self.config.max_passage_hops {
                        return RayHit::miss(current, crossed);
                    }
                    entry = Some(polygon.edge(hit.edge));
                    t_floor = hit.t;
                    current = next;
                }
            }
        }
    }
}
