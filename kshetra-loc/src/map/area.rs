//! Area polygons and their passage edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::PolygonGeometry;
use crate::core::{Bounds, Point2D};

/// Unique identifier of an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub u32);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a passage edge leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassageTarget {
    /// Neighboring area.
    Area(AreaId),
    /// Opening to the outside of the mapped building.
    Exterior,
}

/// What a boundary edge is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Physical obstacle.
    Wall,
    /// Traversable opening; rays pass through.
    Passage(PassageTarget),
}

impl EdgeKind {
    /// True for walls.
    #[inline]
    pub fn is_wall(self) -> bool {
        matches!(self, EdgeKind::Wall)
    }
}

/// Reference to one boundary edge of one area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    /// Owning area.
    pub area: AreaId,
    /// Edge index within the area.
    pub edge: usize,
}

/// A simple, counter-clockwise polygon region of the map.
#[derive(Clone, Debug)]
pub struct Area {
    id: AreaId,
    vertices: Vec<Point2D>,
    kinds: Vec<EdgeKind>,
    bounds: Bounds,
}

impl Area {
    /// Build an area from validated, counter-clockwise vertices.
    ///
    /// `kinds[i]` describes edge `i` (vertex `i` to vertex `i + 1`).
    pub(crate) fn new(id: AreaId, vertices: Vec<Point2D>, kinds: Vec<EdgeKind>) -> Self {
        debug_assert_eq!(vertices.len(), kinds.len());
        let bounds = Bounds::from_points(&vertices);
        Self {
            id,
            vertices,
            kinds,
            bounds,
        }
    }

    /// Area identifier.
    #[inline]
    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Boundary vertices, counter-clockwise.
    #[inline]
    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Kind of edge `i`.
    #[inline]
    pub fn edge_kind(&self, edge: usize) -> EdgeKind {
        self.kinds[edge]
    }

    /// Inward unit normal of edge `i` (interior is to the left).
    #[inline]
    pub fn inward_normal(&self, edge: usize) -> Point2D {
        let (a, b) = self.edge(edge);
        (b - a).normalized().perpendicular()
    }

    /// Iterate `(edge, target)` over passage edges.
    pub fn passages(&self) -> impl Iterator<Item = (usize, PassageTarget)> + '_ {
        self.kinds.iter().enumerate().filter_map(|(i, k)| match k {
            EdgeKind::Passage(target) => Some((i, *target)),
            EdgeKind::Wall => None,
        })
    }

    /// Iterate wall edges as `(index, start, end)`.
    pub fn walls(&self) -> impl Iterator<Item = (usize, Point2D, Point2D)> + '_ {
        (0..self.vertices.len())
            .filter(|&i| self.kinds[i].is_wall())
            .map(|i| {
                let (a, b) = self.edge(i);
                (i, a, b)
            })
    }

    /// Neighboring area ids (exterior passages excluded).
    pub fn neighbor_ids(&self) -> Vec<AreaId> {
        let mut ids: Vec<AreaId> = self
            .passages()
            .filter_map(|(_, t)| match t {
                PassageTarget::Area(id) => Some(id),
                PassageTarget::Exterior => None,
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Vertex centroid.
    pub fn centroid(&self) -> Point2D {
        let n = self.vertices.len().max(1) as f32;
        let sum = self
            .vertices
            .iter()
            .fold(Point2D::ZERO, |acc, &v| acc + v);
        sum * (1.0 / n)
    }
}

impl PolygonGeometry for Area {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn vertex(&self, i: usize) -> Point2D {
        self.vertices[i]
    }

    #[inline]
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}
