//! Load-time validation and normalization of area polygons.

use std::collections::{HashMap, HashSet};

use super::area::{Area, AreaId, EdgeKind, PassageTarget};
use super::description::{AreaDescription, MapDescription};
use super::geometry::{PolygonGeometry, segments_intersect};
use crate::core::Point2D;
use crate::error::MapError;

/// Vertices closer than this are the same vertex.
pub(crate) const VERTEX_EPS: f32 = 1e-4;

/// Minimum enclosed area (m²).
const MIN_AREA: f32 = 1e-6;

/// Validate a description and build counter-clockwise areas.
pub(crate) fn build_areas(desc: &MapDescription) -> Result<Vec<Area>, MapError> {
    if desc.areas.is_empty() {
        return Err(MapError::EmptyMap);
    }

    let mut seen = HashSet::new();
    for a in &desc.areas {
        if !seen.insert(a.id) {
            return Err(MapError::DuplicateArea(AreaId(a.id)));
        }
    }

    let areas = desc
        .areas
        .iter()
        .map(|a| normalize_area(a, &seen))
        .collect::<Result<Vec<_>, _>>()?;

    check_reciprocity(&areas)?;
    Ok(areas)
}

fn normalize_area(desc: &AreaDescription, ids: &HashSet<u32>) -> Result<Area, MapError> {
    let id = AreaId(desc.id);
    let mut vertices: Vec<Point2D> = desc.vertices.iter().map(|&v| Point2D::from(v)).collect();

    if vertices.len() > 1 {
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        if first.distance(last) < VERTEX_EPS {
            vertices.pop();
        }
    }
    let n = vertices.len();
    if n < 3 || vertices.signed_area().abs() < MIN_AREA {
        return Err(MapError::DegeneratePolygon(id));
    }
    for i in 0..n {
        if vertices[i].distance(vertices[(i + 1) % n]) < VERTEX_EPS {
            return Err(MapError::DegeneratePolygon(id));
        }
    }
    check_simple(id, &vertices)?;

    let mut kinds = vec![EdgeKind::Wall; n];
    for p in &desc.passages {
        if p.edge >= n {
            return Err(MapError::PassageEdgeOutOfRange {
                area: id,
                edge: p.edge,
                edges: n,
            });
        }
        if !kinds[p.edge].is_wall() {
            return Err(MapError::DuplicatePassage {
                area: id,
                edge: p.edge,
            });
        }
        let target = match p.to {
            Some(t) if ids.contains(&t) && t != desc.id => PassageTarget::Area(AreaId(t)),
            Some(t) => {
                return Err(MapError::OrphanedPassage {
                    area: id,
                    edge: p.edge,
                    target: AreaId(t),
                });
            }
            None => PassageTarget::Exterior,
        };
        kinds[p.edge] = EdgeKind::Passage(target);
    }

    if vertices.signed_area() < 0.0 {
        vertices.reverse();
        // Edge j (v_j -> v_j+1) becomes edge (n - 2 - j) mod n after reversal.
        let mut remapped = vec![EdgeKind::Wall; n];
        for (j, kind) in kinds.into_iter().enumerate() {
            remapped[(2 * n - 2 - j) % n] = kind;
        }
        kinds = remapped;
    }

    Ok(Area::new(id, vertices, kinds))
}

/// Reject boundaries where two non-adjacent edges touch or cross.
fn check_simple(id: AreaId, vertices: &[Point2D]) -> Result<(), MapError> {
    let n = vertices.len();
    for i in 0..n {
        let (a1, a2) = vertices.edge(i);
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let (b1, b2) = vertices.edge(j);
            if segments_intersect(a1, a2, b1, b2) {
                return Err(MapError::NonSimplePolygon {
                    area: id,
                    first: i,
                    second: j,
                });
            }
        }
    }
    Ok(())
}

/// Every passage must be matched by a passage back over the same vertices.
fn check_reciprocity(areas: &[Area]) -> Result<(), MapError> {
    let index: HashMap<AreaId, &Area> = areas.iter().map(|a| (a.id(), a)).collect();
    for area in areas {
        for (edge, target) in area.passages() {
            let PassageTarget::Area(target_id) = target else {
                continue;
            };
            let mismatch = MapError::PassageMismatch {
                area: area.id(),
                edge,
                target: target_id,
            };
            let Some(other) = index.get(&target_id) else {
                return Err(mismatch);
            };
            let (a, b) = area.edge(edge);
            let matched = other.passages().any(|(e, t)| {
                if t != PassageTarget::Area(area.id()) {
                    return false;
                }
                let (c, d) = other.edge(e);
                (a.distance(d) < VERTEX_EPS && b.distance(c) < VERTEX_EPS)
                    || (a.distance(c) < VERTEX_EPS && b.distance(d) < VERTEX_EPS)
            });
            if !matched {
                return Err(mismatch);
            }
        }
    }
    Ok(())
}
