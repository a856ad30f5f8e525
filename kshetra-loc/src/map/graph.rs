//! The immutable Area Graph: areas plus passage adjacency.

use std::collections::HashMap;
use std::path::Path;

use super::area::{Area, AreaId, EdgeKind, PassageTarget};
use super::description::MapDescription;
use super::geometry::PolygonGeometry;
use super::validate::build_areas;
use crate::core::{Bounds, Point2D};
use crate::error::MapError;

/// Polygonal map of a building.
///
/// Built once, validated, then shared read-only (typically behind an `Arc`)
/// by every component and worker thread.
#[derive(Clone, Debug)]
pub struct AreaGraphMap {
    areas: Vec<Area>,
    index: HashMap<AreaId, usize>,
    bounds: Bounds,
}

impl AreaGraphMap {
    /// Validate a description and build the map.
    pub fn from_description(desc: &MapDescription) -> Result<Self, MapError> {
        let areas = build_areas(desc)?;
        let index = areas.iter().enumerate().map(|(i, a)| (a.id(), i)).collect();
        let bounds = areas
            .iter()
            .fold(Bounds::empty(), |acc, a| acc.union(&a.bounds()));

        let passages: usize = areas.iter().map(|a| a.passages().count()).sum();
        log::info!(
            "Area graph loaded: {} areas, {} passage edges, extent {:.1}x{:.1} m",
            areas.len(),
            passages,
            bounds.width(),
            bounds.height()
        );

        Ok(Self {
            areas,
            index,
            bounds,
        })
    }

    /// Parse and build from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MapError> {
        let desc: MapDescription = serde_yaml::from_str(yaml)?;
        Self::from_description(&desc)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Number of areas.
    #[inline]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Always false for a loaded map.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// All areas, in load order.
    #[inline]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Area by id.
    #[inline]
    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.index.get(&id).map(|&i| &self.areas[i])
    }

    /// Extent of the whole map.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Area containing `p`, if any.
    ///
    /// Boundary points are owned by exactly one area (see
    /// [`PolygonGeometry::contains`]).
    pub fn locate(&self, p: Point2D) -> Option<AreaId> {
        self.areas.iter().find(|a| a.contains(p)).map(|a| a.id())
    }

    /// Areas reachable through one passage.
    pub fn neighbors(&self, id: AreaId) -> Vec<AreaId> {
        self.area(id).map(Area::neighbor_ids).unwrap_or_default()
    }

    /// Where a ray leaving `area` through `edge` continues.
    pub fn passage_target(&self, area: AreaId, edge: usize) -> Option<PassageTarget> {
        match self.area(area)?.edge_kind(edge) {
            EdgeKind::Passage(target) => Some(target),
            EdgeKind::Wall => None,
        }
    }
}
