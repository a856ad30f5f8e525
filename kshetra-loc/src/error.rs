//! Error types for map loading, scan ingestion and localization.
//!
//! Only map defects are hard failures. Per-frame problems (empty scans,
//! failed searches, divergence) are reported through result flags instead.

use thiserror::Error;

use crate::map::AreaId;

pub use crate::config::ConfigLoadError;

/// Defects found while loading or validating an Area Graph map.
#[derive(Debug, Error)]
pub enum MapError {
    /// Reading the map file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The map description is not valid YAML for the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The map has no areas.
    #[error("Map contains no areas")]
    EmptyMap,

    /// Two areas share an identifier.
    #[error("Duplicate area id {0}")]
    DuplicateArea(AreaId),

    /// Fewer than three distinct vertices, or zero enclosed area.
    #[error("Area {0} is degenerate (needs at least 3 vertices and non-zero area)")]
    DegeneratePolygon(AreaId),

    /// Two non-adjacent edges of the boundary intersect.
    #[error("Area {area} is not simple: edges {first} and {second} intersect")]
    NonSimplePolygon {
        /// Offending area.
        area: AreaId,
        /// First edge index.
        first: usize,
        /// Second edge index.
        second: usize,
    },

    /// A passage names an edge the polygon does not have.
    #[error("Area {area}: passage edge {edge} out of range (polygon has {edges} edges)")]
    PassageEdgeOutOfRange {
        /// Offending area.
        area: AreaId,
        /// Edge index given.
        edge: usize,
        /// Number of edges.
        edges: usize,
    },

    /// An edge is listed in more than one passage.
    #[error("Area {area}: edge {edge} listed in more than one passage")]
    DuplicatePassage {
        /// Offending area.
        area: AreaId,
        /// Edge index.
        edge: usize,
    },

    /// A passage points at an area that does not exist.
    #[error("Area {area}: passage on edge {edge} references unknown area {target}")]
    OrphanedPassage {
        /// Offending area.
        area: AreaId,
        /// Edge index.
        edge: usize,
        /// Missing target.
        target: AreaId,
    },

    /// The target area has no passage back over the same vertices.
    #[error("Area {area}: passage on edge {edge} to area {target} is not reciprocated")]
    PassageMismatch {
        /// Offending area.
        area: AreaId,
        /// Edge index.
        edge: usize,
        /// Target area lacking the matching edge.
        target: AreaId,
    },
}

/// Malformed organized scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Buffer length does not match `rings x columns`.
    #[error("Scan shape mismatch: {rings} rings x {columns} columns but {len} points")]
    ShapeMismatch {
        /// Declared rings.
        rings: usize,
        /// Declared columns.
        columns: usize,
        /// Actual buffer length.
        len: usize,
    },
}

/// Failures of the localization pipeline that force re-localization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocalizationError {
    /// No area reachable from the current one contains the pose.
    #[error("Topology inconsistency: pose ({x:.2}, {y:.2}) not inside area {from} or its neighbors")]
    TopologyInconsistency {
        /// Area the search started from.
        from: AreaId,
        /// Pose x.
        x: f32,
        /// Pose y.
        y: f32,
    },

    /// An externally supplied pose lies outside every area.
    #[error("Pose ({x:.2}, {y:.2}) is outside the map")]
    OutsideMap {
        /// Pose x.
        x: f32,
        /// Pose y.
        y: f32,
    },
}
